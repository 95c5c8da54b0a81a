use super::{tool_table, LanguageAdapter};
use crate::analyze::complexity::ComplexityRules;
use crate::analyze::dependencies;
use crate::analyze::function_length::{BlockEnd, FunctionSyntax};
use crate::analyze::patterns::{SecurityPattern, Severity};
use crate::parse::{
    coverage, lint, security, test, LintSummary, SecuritySummary, TestSummary, TypecheckSummary,
};
use crate::types::config::{MetricCatalog, MetricPolicy, ToolRole};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

// Plain functions and methods with a receiver.
static SYNTAX: LazyLock<FunctionSyntax> = LazyLock::new(|| {
    FunctionSyntax::new(r"^\s*func\s+(?:\([^)]*\)\s*)?(\w+)", BlockEnd::ClosingBrace)
});

static PATTERNS: LazyLock<Vec<SecurityPattern>> = LazyLock::new(|| {
    vec![
        SecurityPattern::new(
            "tls_insecure",
            Severity::High,
            r"InsecureSkipVerify\s*:\s*true",
        ),
        SecurityPattern::new(
            "sql_sprintf",
            Severity::High,
            r#"fmt\.Sprintf\(\s*"(SELECT|INSERT|UPDATE|DELETE)"#,
        ),
        SecurityPattern::new("exec_command", Severity::Medium, r"exec\.Command\s*\("),
        SecurityPattern::new("unsafe_pointer", Severity::Medium, r"unsafe\.Pointer"),
        SecurityPattern::new("random_weak", Severity::Low, r#""math/rand""#),
    ]
});

#[derive(Debug, Clone, Copy, Default)]
pub struct GoAdapter;

impl LanguageAdapter for GoAdapter {
    fn language(&self) -> &'static str {
        "go"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn security_metric(&self) -> &'static str {
        "gosec_issues"
    }

    fn default_tools(&self) -> BTreeMap<ToolRole, String> {
        tool_table(&[
            (ToolRole::Test, "go test -cover ./..."),
            (ToolRole::Lint, "golangci-lint run"),
            (ToolRole::Format, "gofmt -w ."),
            (ToolRole::Typecheck, "go vet ./..."),
            (ToolRole::Security, "gosec -fmt=json ./..."),
            (ToolRole::Dependencies, "govulncheck ./..."),
            (ToolRole::Build, "go build ./..."),
        ])
    }

    fn default_metrics(&self) -> MetricCatalog {
        BTreeMap::from([
            (
                "performance".to_string(),
                BTreeMap::from([
                    ("execution_time".to_string(), MetricPolicy::relative(-5.0, 15.0)),
                    ("memory_usage".to_string(), MetricPolicy::relative(0.0, 20.0)),
                    ("binary_size".to_string(), MetricPolicy::relative(0.0, 10.0)),
                ]),
            ),
            (
                "quality".to_string(),
                BTreeMap::from([
                    ("test_coverage".to_string(), MetricPolicy::absolute(80.0, "%")),
                    (
                        "cyclomatic_complexity".to_string(),
                        MetricPolicy::absolute(15.0, "max").at_most(),
                    ),
                ]),
            ),
            (
                "security".to_string(),
                BTreeMap::from([
                    (
                        "gosec_issues".to_string(),
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
        test::parse_go_test(output)
    }

    fn parse_lint_output(&self, output: &str) -> LintSummary {
        lint::parse_golangci(output)
    }

    fn parse_security_output(&self, output: &str) -> SecuritySummary {
        security::parse_gosec(output)
    }

    fn parse_typecheck_output(&self, output: &str) -> TypecheckSummary {
        lint::parse_go_vet(output)
    }

    fn parse_dependency_audit(&self, output: &str) -> SecuritySummary {
        security::parse_govulncheck(output)
    }

    fn extract_coverage(&self, output: &str) -> Option<f64> {
        coverage::mean_package_coverage(output).or_else(|| coverage::extract_coverage(output))
    }

    fn complexity_rules(&self) -> ComplexityRules {
        ComplexityRules {
            keywords: &["if", "else", "for", "switch", "case", "select"],
            operators: &["&&", "||"],
        }
    }

    fn function_syntax(&self) -> &FunctionSyntax {
        &SYNTAX
    }

    fn extra_security_patterns(&self) -> &[SecurityPattern] {
        &PATTERNS
    }

    fn dependencies(&self, project_root: &Path) -> Vec<String> {
        dependencies::go(project_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_coverage_is_averaged() {
        let output = "\
ok  \texample.com/svc/api\t0.012s\tcoverage: 80.0% of statements
ok  \texample.com/svc/store\t0.020s\tcoverage: 60.0% of statements
";
        assert_eq!(GoAdapter.extract_coverage(output), Some(70.0));
        let summary = GoAdapter.parse_test_output(output);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.coverage, Some(70.0));
    }

    #[test]
    fn methods_are_named_after_receiver() {
        let source = "func (s *Server) Start(ctx context.Context) error {\n\treturn nil\n}\n";
        let spans =
            crate::analyze::function_length::function_spans(source, GoAdapter.function_syntax());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "Start");
        assert_eq!(spans[0].length, 3);
    }

    #[test]
    fn insecure_tls_is_high_severity() {
        let source = "cfg := &tls.Config{InsecureSkipVerify: true}\n";
        let findings = GoAdapter.check_security_patterns(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn vet_output_feeds_typecheck() {
        let output = "./main.go:9:2: unreachable code\n";
        assert_eq!(GoAdapter.parse_typecheck_output(output).errors, 1);
    }
}
