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
    FunctionSyntax::new(
        r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)"#,
        BlockEnd::ClosingBrace,
    )
});

static PATTERNS: LazyLock<Vec<SecurityPattern>> = LazyLock::new(|| {
    vec![
        SecurityPattern::new("transmute", Severity::High, r"\bmem::transmute\b"),
        SecurityPattern::new(
            "tls_insecure",
            Severity::High,
            r"danger_accept_invalid_certs\s*\(\s*true",
        ),
        SecurityPattern::new("unsafe_block", Severity::Medium, r"\bunsafe\s*\{"),
        SecurityPattern::new("process_command", Severity::Medium, r"Command::new\s*\("),
    ]
});

#[derive(Debug, Clone, Copy, Default)]
pub struct RustAdapter;

impl LanguageAdapter for RustAdapter {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn security_metric(&self) -> &'static str {
        "audit_vulnerabilities"
    }

    fn default_tools(&self) -> BTreeMap<ToolRole, String> {
        tool_table(&[
            (ToolRole::Test, "cargo test"),
            (ToolRole::Lint, "cargo clippy --all-targets"),
            (ToolRole::Format, "cargo fmt"),
            (ToolRole::Typecheck, "cargo check --all-targets"),
            (ToolRole::Security, "cargo audit --json"),
            (ToolRole::Dependencies, "cargo deny check"),
            (ToolRole::Build, "cargo build --release"),
        ])
    }

    fn default_metrics(&self) -> MetricCatalog {
        BTreeMap::from([
            (
                "performance".to_string(),
                BTreeMap::from([
                    ("execution_time".to_string(), MetricPolicy::relative(-5.0, 10.0)),
                    ("binary_size".to_string(), MetricPolicy::relative(0.0, 10.0)),
                    ("compile_time".to_string(), MetricPolicy::relative(0.0, 20.0)),
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
                    (
                        "lint_warnings".to_string(),
                        MetricPolicy::absolute(0.0, "count").at_most(),
                    ),
                ]),
            ),
            (
                "security".to_string(),
                BTreeMap::from([
                    (
                        "audit_vulnerabilities".to_string(),
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
        test::parse_cargo_test(output)
    }

    fn parse_lint_output(&self, output: &str) -> LintSummary {
        lint::parse_clippy(output)
    }

    fn parse_security_output(&self, output: &str) -> SecuritySummary {
        security::parse_cargo_audit(output)
    }

    /// `cargo check` prints the same diagnostics as clippy.
    fn parse_typecheck_output(&self, output: &str) -> TypecheckSummary {
        let diagnostics = lint::parse_clippy(output);
        TypecheckSummary::new(diagnostics.errors, diagnostics.warnings)
    }

    fn parse_dependency_audit(&self, output: &str) -> SecuritySummary {
        security::parse_cargo_deny(output)
    }

    fn complexity_rules(&self) -> ComplexityRules {
        ComplexityRules {
            keywords: &["if", "else", "for", "while", "loop", "match"],
            operators: &["&&", "||", "=>"],
        }
    }

    fn function_syntax(&self) -> &FunctionSyntax {
        &SYNTAX
    }

    fn extra_security_patterns(&self) -> &[SecurityPattern] {
        &PATTERNS
    }

    fn dependencies(&self, project_root: &Path) -> Vec<String> {
        dependencies::cargo(project_root)
    }
}
