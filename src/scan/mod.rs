pub mod filesystem;

use crate::error::{GateError, Result};
use crate::templates::{self, ProjectTemplate, DEFAULT_TEMPLATE};
use filesystem::{list_files, read_to_string_if_exists, relative_path};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Files at most three directories below the root are considered.
const MAX_DEPTH: usize = 4;

const MANIFESTS: [&str; 5] = [
    "package.json",
    "requirements.txt",
    "Cargo.toml",
    "go.mod",
    "pyproject.toml",
];

const INDICATOR_POINTS: u32 = 3;
const KEYWORD_POINTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateScore {
    pub template: String,
    pub score: u32,
    pub indicators: Vec<String>,
    pub keyword_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub template: String,
    /// One entry per catalog template, in catalog order.
    pub scores: Vec<TemplateScore>,
}

impl Classification {
    pub fn score_of(&self, template: &str) -> Option<u32> {
        self.scores
            .iter()
            .find(|score| score.template == template)
            .map(|score| score.score)
    }

    pub fn template(&self) -> Option<&'static ProjectTemplate> {
        templates::find(&self.template)
    }
}

#[derive(Debug, Default)]
struct ProjectSignals {
    names: BTreeSet<String>,
    paths: BTreeSet<String>,
    manifests: String,
}

impl ProjectSignals {
    fn collect(root: &Path) -> Self {
        let mut signals = Self::default();
        for path in list_files(root, Some(MAX_DEPTH), &[]) {
            if let Some(name) = path.file_name() {
                signals.names.insert(name.to_string_lossy().into_owned());
            }
            signals.paths.insert(relative_path(root, &path));
        }

        for manifest in MANIFESTS {
            if let Some(content) = read_to_string_if_exists(&root.join(manifest)) {
                signals.manifests.push_str(&content.to_lowercase());
                signals.manifests.push('\n');
            }
        }
        signals
    }

    fn has_indicator(&self, indicator: &str) -> bool {
        if indicator.contains('/') {
            self.paths.contains(indicator)
        } else {
            self.names.contains(indicator)
        }
    }

    fn score(&self, template: &ProjectTemplate) -> TemplateScore {
        let indicators = template
            .indicators
            .iter()
            .filter(|indicator| self.has_indicator(indicator))
            .map(|indicator| indicator.to_string())
            .collect::<Vec<_>>();
        let keyword_hit = template
            .keywords
            .iter()
            .any(|keyword| self.manifests.contains(&keyword.to_lowercase()));

        let score = INDICATOR_POINTS * indicators.len() as u32
            + if keyword_hit { KEYWORD_POINTS } else { 0 };
        TemplateScore {
            template: template.name.to_string(),
            score,
            indicators,
            keyword_hit,
        }
    }
}

/// Score `root` against every template. The highest score wins, the first
/// in catalog order on a tie, and [`DEFAULT_TEMPLATE`] when nothing scores.
pub fn classify(root: &Path) -> Result<Classification> {
    if !root.is_dir() {
        return Err(GateError::PathNotFound(root.display().to_string()));
    }

    let signals = ProjectSignals::collect(root);
    let scores = templates::catalog()
        .iter()
        .map(|template| signals.score(template))
        .collect::<Vec<_>>();

    let mut best: Option<&TemplateScore> = None;
    for score in scores.iter().filter(|score| score.score > 0) {
        if best.map_or(true, |current| score.score > current.score) {
            best = Some(score);
        }
    }
    let template = best
        .map(|score| score.template.clone())
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    debug!(
        root = %root.display(),
        files = signals.paths.len(),
        template = %template,
        "classified project"
    );
    Ok(Classification { template, scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn cargo_project_scores_two_indicators() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(dir.path(), "Cargo.toml", "[package]\nname = \"demo\"\n");
        write(dir.path(), "src/main.rs", "fn main() {}\n");

        let classification = classify(dir.path()).expect("classify should succeed");
        assert_eq!(classification.template, "rust_project");
        assert_eq!(classification.score_of("rust_project"), Some(6));
    }

    #[test]
    fn manifest_keyword_adds_five() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(
            dir.path(),
            "Cargo.toml",
            "[package]\nname = \"demo\"\n\n[dependencies]\nTokio = \"1\"\n",
        );
        write(dir.path(), "src/main.rs", "fn main() {}\n");

        let classification = classify(dir.path()).expect("classify should succeed");
        assert_eq!(classification.template, "rust_project");
        assert_eq!(classification.score_of("rust_project"), Some(11));
    }

    #[test]
    fn empty_directory_uses_default_template() {
        let dir = TempDir::new().expect("temp dir should exist");
        let classification = classify(dir.path()).expect("classify should succeed");
        assert_eq!(classification.template, DEFAULT_TEMPLATE);
        assert!(classification.scores.iter().all(|score| score.score == 0));
        assert_eq!(classification.scores.len(), templates::catalog().len());
    }

    #[test]
    fn ties_go_to_first_template_in_catalog() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(dir.path(), "requirements.txt", "requests\n");

        // requirements.txt indicates both python_ml and python_api.
        let classification = classify(dir.path()).expect("classify should succeed");
        assert_eq!(classification.score_of("python_ml"), Some(3));
        assert_eq!(classification.score_of("python_api"), Some(3));
        assert_eq!(classification.template, "python_ml");
    }

    #[test]
    fn ignored_and_deep_files_do_not_count() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(dir.path(), "node_modules/pkg/package.json", "{}");
        write(dir.path(), "a/b/c/d/go.mod", "module x\n");

        let classification = classify(dir.path()).expect("classify should succeed");
        assert_eq!(classification.score_of("typescript_node"), Some(0));
        assert_eq!(classification.score_of("go_service"), Some(0));
    }

    #[test]
    fn nested_indicator_names_match_anywhere() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(dir.path(), "package.json", r#"{"dependencies": {"react": "^18"}}"#);
        write(dir.path(), "src/App.tsx", "export default function App() {}\n");

        let classification = classify(dir.path()).expect("classify should succeed");
        assert_eq!(classification.template, "react_frontend");
        assert_eq!(classification.score_of("react_frontend"), Some(11));
    }

    #[test]
    fn classified_language_resolves_to_matching_adapter() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(dir.path(), "go.mod", "module example.com/svc\n\nrequire github.com/gin-gonic/gin v1.9.1\n");

        let classification = classify(dir.path()).expect("classify should succeed");
        let template = classification.template().expect("template should exist");
        assert_eq!(adapters::resolve(template.language).language(), template.language);
        assert_eq!(template.name, "go_service");
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = classify(Path::new("/nonexistent/qualitygate-root"));
        assert!(matches!(result, Err(GateError::PathNotFound(_))));
    }
}
