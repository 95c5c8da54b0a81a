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

// `function name(`, `const name = (..) =>` and `const name = async x =>`.
static SYNTAX: LazyLock<FunctionSyntax> = LazyLock::new(|| {
    FunctionSyntax::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w*)\s*\(|^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|\w+)\s*(?::[^=]+)?=>",
        BlockEnd::ClosingBrace,
    )
});

static PATTERNS: LazyLock<Vec<SecurityPattern>> = LazyLock::new(|| {
    vec![
        SecurityPattern::new("eval_usage", Severity::High, r"\beval\s*\("),
        SecurityPattern::new("function_constructor", Severity::High, r"\bnew\s+Function\s*\("),
        SecurityPattern::new("inner_html", Severity::Medium, r"\.innerHTML\s*="),
        SecurityPattern::new(
            "dangerously_set_inner_html",
            Severity::Medium,
            r"dangerouslySetInnerHTML",
        ),
        SecurityPattern::new("document_write", Severity::Medium, r"document\.write\s*\("),
        SecurityPattern::new(
            "child_process",
            Severity::Medium,
            r#"require\(\s*['"](?:node:)?child_process['"]\s*\)|from\s+['"](?:node:)?child_process['"]"#,
        ),
        SecurityPattern::new("random_weak", Severity::Low, r"Math\.random\s*\("),
    ]
});

/// Serves both TypeScript and JavaScript projects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptAdapter;

impl LanguageAdapter for TypeScriptAdapter {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"]
    }

    fn security_metric(&self) -> &'static str {
        "audit_vulnerabilities"
    }

    fn default_tools(&self) -> BTreeMap<ToolRole, String> {
        tool_table(&[
            (ToolRole::Test, "npm test"),
            (ToolRole::Lint, "npx eslint ."),
            (ToolRole::Format, "npx prettier --write ."),
            (ToolRole::Typecheck, "npx tsc --noEmit"),
            (ToolRole::Security, "npm audit --json"),
            (ToolRole::Build, "npm run build"),
        ])
    }

    fn default_metrics(&self) -> MetricCatalog {
        BTreeMap::from([
            (
                "performance".to_string(),
                BTreeMap::from([
                    ("execution_time".to_string(), MetricPolicy::relative(-5.0, 15.0)),
                    ("bundle_size".to_string(), MetricPolicy::relative(-5.0, 10.0)),
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
                        "lint_errors".to_string(),
                        MetricPolicy::absolute(0.0, "count").at_most(),
                    ),
                ]),
            ),
            (
                "security".to_string(),
                BTreeMap::from([(
                    "audit_vulnerabilities".to_string(),
                    MetricPolicy::absolute(0.0, "count").at_most(),
                )]),
            ),
        ])
    }

    fn parse_test_output(&self, output: &str) -> TestSummary {
        test::parse_js_test(output)
    }

    fn parse_lint_output(&self, output: &str) -> LintSummary {
        lint::parse_eslint(output)
    }

    fn parse_security_output(&self, output: &str) -> SecuritySummary {
        security::parse_npm_audit(output)
    }

    fn parse_typecheck_output(&self, output: &str) -> TypecheckSummary {
        lint::parse_tsc(output)
    }

    fn parse_dependency_audit(&self, output: &str) -> SecuritySummary {
        security::parse_npm_audit(output)
    }

    fn complexity_rules(&self) -> ComplexityRules {
        ComplexityRules {
            keywords: &["if", "else", "for", "while", "do", "switch", "case", "catch"],
            operators: &["&&", "||", "??", " ? "],
        }
    }

    fn function_syntax(&self) -> &FunctionSyntax {
        &SYNTAX
    }

    fn extra_security_patterns(&self) -> &[SecurityPattern] {
        &PATTERNS
    }

    fn dependencies(&self, project_root: &Path) -> Vec<String> {
        dependencies::node(project_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitest_summary_counts() {
        let output = " Test Files  1 failed | 3 passed (4)\n      Tests  2 failed | 14 passed (16)\n";
        let summary = TypeScriptAdapter.parse_test_output(output);
        assert_eq!((summary.failed, summary.passed), (2, 14));
    }

    #[test]
    fn arrow_and_declared_functions_are_measured() {
        let source = "\
export async function load(id: string) {
  const row = await db.get(id);
  return row;
}

export const render = (props: Props) => {
  return null;
};

const noop = () => {};
";
        let spans = crate::analyze::function_length::function_spans(source, TypeScriptAdapter.function_syntax());
        let names = spans.iter().map(|span| span.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["load", "render", "noop"]);
        assert_eq!(spans[0].length, 4);
        assert_eq!(spans[1].length, 3);
        assert_eq!(spans[2].length, 1);
    }

    #[test]
    fn complexity_counts_logical_operators() {
        let source = "if (a && b) {\n} else if (c ?? d) {\n}\nconst x = y ? 1 : 2;\n";
        // if, else, if, &&, ??, ` ? `
        assert_eq!(TypeScriptAdapter.estimate_complexity(source), 7);
    }

    #[test]
    fn dom_sinks_are_flagged() {
        let findings = TypeScriptAdapter.check_security_patterns("el.innerHTML = html;\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "inner_html");
    }
}
