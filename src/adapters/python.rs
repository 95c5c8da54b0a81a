use super::{tool_table, LanguageAdapter};
use crate::analyze::complexity::ComplexityRules;
use crate::analyze::dependencies;
use crate::analyze::function_length::{BlockEnd, FunctionSyntax};
use crate::analyze::patterns::{SecurityPattern, Severity};
use crate::parse::{lint, security, test, LintSummary, SecuritySummary, TestSummary, TypecheckSummary};
use crate::types::config::{MetricCatalog, MetricPolicy, ToolRole};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static SYNTAX: LazyLock<FunctionSyntax> = LazyLock::new(|| {
    FunctionSyntax::new(r"^\s*(?:async\s+)?def\s+(\w+)", BlockEnd::Indentation)
});

static PATTERNS: LazyLock<Vec<SecurityPattern>> = LazyLock::new(|| {
    vec![
        SecurityPattern::new(
            "pickle_usage",
            Severity::High,
            r"import\s+pickle|pickle\.loads|pickle\.load",
        ),
        SecurityPattern::new("eval_usage", Severity::High, r"\beval\s*\("),
        SecurityPattern::new("exec_usage", Severity::High, r"\bexec\s*\("),
        SecurityPattern::new("input_usage", Severity::Medium, r"\binput\s*\("),
        SecurityPattern::new("yaml_unsafe", Severity::Medium, r"yaml\.load\s*\("),
        SecurityPattern::new(
            "sql_string_format",
            Severity::Medium,
            r"(SELECT|INSERT|UPDATE|DELETE).*[%{}].*",
        ),
        SecurityPattern::new("shell_true", Severity::Medium, r"shell\s*=\s*True"),
        SecurityPattern::new("temp_file_insecure", Severity::Medium, r"tempfile\.mktemp"),
        SecurityPattern::new("random_weak", Severity::Medium, r"random\.random|random\.choice"),
    ]
});

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonAdapter;

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> &'static str {
        "python"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi", "pyx"]
    }

    fn security_metric(&self) -> &'static str {
        "bandit_issues"
    }

    fn default_tools(&self) -> BTreeMap<ToolRole, String> {
        tool_table(&[
            (ToolRole::Test, "pytest --cov=. tests/"),
            (ToolRole::Lint, "ruff check ."),
            (ToolRole::Format, "ruff format ."),
            (ToolRole::Typecheck, "mypy ."),
            (ToolRole::Security, "bandit -r . -f json"),
            (ToolRole::Dependencies, "safety check"),
        ])
    }

    fn default_metrics(&self) -> MetricCatalog {
        BTreeMap::from([
            (
                "performance".to_string(),
                BTreeMap::from([
                    ("execution_time".to_string(), MetricPolicy::relative(-5.0, 15.0)),
                    ("memory_usage".to_string(), MetricPolicy::relative(0.0, 20.0)),
                    ("import_time".to_string(), MetricPolicy::relative(-10.0, 10.0)),
                ]),
            ),
            (
                "quality".to_string(),
                BTreeMap::from([
                    ("test_coverage".to_string(), MetricPolicy::absolute(80.0, "%")),
                    (
                        "cyclomatic_complexity".to_string(),
                        MetricPolicy::absolute(10.0, "max").at_most(),
                    ),
                ]),
            ),
            (
                "security".to_string(),
                BTreeMap::from([
                    (
                        "bandit_issues".to_string(),
                        MetricPolicy::absolute(0.0, "count").at_most(),
                    ),
                    (
                        "dependency_vulnerabilities".to_string(),
                        MetricPolicy::absolute(0.0, "count").at_most(),
                    ),
                ]),
            ),
        ])
    }

    fn parse_test_output(&self, output: &str) -> TestSummary {
        test::parse_pytest(output)
    }

    /// ruff: `E` (pycodestyle errors) and `F` (pyflakes) codes are errors.
    fn parse_lint_output(&self, output: &str) -> LintSummary {
        lint::parse_located_codes(output, &['E', 'F'])
    }

    fn parse_security_output(&self, output: &str) -> SecuritySummary {
        security::parse_bandit(output)
    }

    fn parse_typecheck_output(&self, output: &str) -> TypecheckSummary {
        lint::parse_mypy(output)
    }

    fn parse_dependency_audit(&self, output: &str) -> SecuritySummary {
        security::parse_safety(output)
    }

    fn complexity_rules(&self) -> ComplexityRules {
        ComplexityRules {
            keywords: &[
                "if", "elif", "else", "for", "while", "try", "except", "with", "and", "or",
                "lambda",
            ],
            operators: &[],
        }
    }

    fn function_syntax(&self) -> &FunctionSyntax {
        &SYNTAX
    }

    fn extra_security_patterns(&self) -> &[SecurityPattern] {
        &PATTERNS
    }

    fn dependencies(&self, project_root: &Path) -> Vec<String> {
        dependencies::python(project_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::patterns::count_high;
    use crate::gate;

    #[test]
    fn pytest_summary_wins_over_line_tally() {
        let output = "\
tests/test_a.py::test_one PASSED
tests/test_a.py::test_two PASSED
==================== 2 failed, 5 passed in 1.23s ====================
";
        let summary = PythonAdapter.parse_test_output(output);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.passed, 5);
        assert!(!summary.success);
    }

    #[test]
    fn long_function_is_reported_with_location() {
        let mut source = String::from("import os\n\nasync def handler(request):\n");
        for i in 0..31 {
            source.push_str(&format!("    step_{i}()\n"));
        }
        source.push_str("\ndef tiny():\n    return 1\n");

        let violations = PythonAdapter.validate_function_length("api.py", &source, 30);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].name, "handler");
        assert_eq!(violations[0].line, 3);
        assert_eq!(violations[0].length, 33);
        assert_eq!(PythonAdapter.count_functions(&source), 2);
    }

    #[test]
    fn python_patterns_extend_baseline() {
        let source = "import pickle\ndata = pickle.loads(blob)\nsubprocess.run(cmd, shell=True)\n";
        let findings = PythonAdapter.check_security_patterns(source);
        assert!(findings.iter().any(|f| f.kind == "shell_true"));
        assert_eq!(count_high(&findings), 2);
    }

    #[test]
    fn complexity_counts_boolean_operators() {
        let source = "if a and b:\n    pass\nelif c or d:\n    pass\n";
        assert_eq!(PythonAdapter.estimate_complexity(source), 5);
    }

    #[test]
    fn default_counts_are_ceilings() {
        let metrics = PythonAdapter.default_metrics();
        let bandit = &metrics["security"]["bandit_issues"];
        assert!(gate::evaluate(0.0, bandit).pass);
        assert!(!gate::evaluate(1.0, bandit).pass);
        assert!(metrics["performance"].contains_key("execution_time"));
        assert_eq!(
            PythonAdapter.default_tools().get(&ToolRole::Security).map(String::as_str),
            Some("bandit -r . -f json")
        );
    }
}
