use super::function_length::FunctionLengthViolation;
use super::patterns::SecurityFinding;
use crate::adapters::LanguageAdapter;
use crate::error::{GateError, Result};
use crate::scan::filesystem::{read_to_string_if_exists, relative_path};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileComplexity {
    pub file: String,
    pub complexity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectScan {
    pub files: usize,
    pub functions: usize,
    /// Highest per-file estimate, `None` when no source file was read.
    pub max_complexity: Option<u32>,
    pub complexity: Vec<FileComplexity>,
    pub violations: Vec<FunctionLengthViolation>,
    pub findings: Vec<ScanFinding>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFinding {
    pub file: String,
    #[serde(flatten)]
    pub finding: SecurityFinding,
}

impl ProjectScan {
    pub fn high_findings(&self) -> usize {
        self.findings
            .iter()
            .filter(|scan| scan.finding.severity == super::patterns::Severity::High)
            .count()
    }
}

/// Run every static heuristic of `adapter` over the project's source files.
/// Files that cannot be read as UTF-8 are skipped.
pub fn scan_project(
    adapter: &dyn LanguageAdapter,
    root: &Path,
    max_function_lines: usize,
) -> Result<ProjectScan> {
    if !root.is_dir() {
        return Err(GateError::PathNotFound(root.display().to_string()));
    }

    let mut scan = ProjectScan::default();
    for path in adapter.project_files(root) {
        let Some(source) = read_to_string_if_exists(&path) else {
            debug!(path = %path.display(), "skipping unreadable source file");
            continue;
        };
        let file = relative_path(root, &path);
        scan.files += 1;
        scan.functions += adapter.count_functions(&source);

        let complexity = adapter.estimate_complexity(&source);
        scan.max_complexity = Some(scan.max_complexity.map_or(complexity, |max| max.max(complexity)));
        scan.complexity.push(FileComplexity {
            file: file.clone(),
            complexity,
        });

        scan.violations
            .extend(adapter.validate_function_length(&file, &source, max_function_lines));
        scan.findings.extend(
            adapter
                .check_security_patterns(&source)
                .into_iter()
                .map(|finding| ScanFinding {
                    file: file.clone(),
                    finding,
                }),
        );
    }
    scan.dependencies = adapter.dependencies(root);

    info!(
        language = adapter.language(),
        files = scan.files,
        violations = scan.violations.len(),
        findings = scan.findings.len(),
        "static scan complete"
    );
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::PythonAdapter;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs should be created");
        }
        fs::write(path, content).expect("source should be written");
    }

    #[test]
    fn scan_aggregates_heuristics_across_files() {
        let dir = TempDir::new().expect("temp dir should exist");
        let mut long = String::from("def long():\n");
        for i in 0..40 {
            long.push_str(&format!("    if x{i}:\n        pass\n"));
        }
        write(dir.path(), "app/long.py", &long);
        write(dir.path(), "app/secrets.py", "API_TOKEN = \"abc123\"\neval(data)\n");
        write(dir.path(), ".venv/lib/site.py", "eval(x)\n");
        write(dir.path(), "requirements.txt", "fastapi\n");

        let scan = scan_project(&PythonAdapter, dir.path(), 30).expect("scan should succeed");
        assert_eq!(scan.files, 2);
        assert_eq!(scan.functions, 1);
        assert_eq!(scan.max_complexity, Some(41));
        assert_eq!(scan.violations.len(), 1);
        assert_eq!(scan.violations[0].file, "app/long.py");
        assert!(scan.findings.iter().all(|f| f.file == "app/secrets.py"));
        assert_eq!(scan.high_findings(), 2);
        assert_eq!(scan.dependencies, vec!["fastapi"]);
    }

    #[test]
    fn empty_project_has_no_complexity() {
        let dir = TempDir::new().expect("temp dir should exist");
        let scan = scan_project(&PythonAdapter, dir.path(), 30).expect("scan should succeed");
        assert_eq!(scan.files, 0);
        assert_eq!(scan.max_complexity, None);
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = scan_project(&PythonAdapter, Path::new("/nonexistent/qualitygate"), 30);
        assert!(matches!(result, Err(GateError::PathNotFound(_))));
    }
}
