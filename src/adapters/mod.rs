//! One adapter per language: default tools and metric policies, output
//! parsers, and the static heuristics the project scan runs.
//!
//! Every method except identity and defaults has a generic implementation,
//! so an adapter only overrides what its tools do differently.

pub mod go;
pub mod python;
pub mod registry;
pub mod rust_lang;
pub mod typescript;

use crate::analyze::complexity::{self, ComplexityRules};
use crate::analyze::function_length::{self, FunctionLengthViolation, FunctionSyntax};
use crate::analyze::patterns::{self, SecurityFinding, SecurityPattern};
use crate::error::Result;
use crate::parse::{
    coverage, generic, LintSummary, ParsedResult, SecuritySummary, TestSummary, TypecheckSummary,
};
use crate::scan::filesystem;
use crate::tools::{ToolCommand, ToolInvoker, ToolOutput};
use crate::types::config::{MetricCatalog, ToolRole};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use go::GoAdapter;
pub use python::PythonAdapter;
pub use registry::{is_known_language, known_languages, resolve};
pub use rust_lang::RustAdapter;
pub use typescript::TypeScriptAdapter;

pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> &'static str;

    fn source_extensions(&self) -> &'static [&'static str];

    /// Metric fed by the high-severity count of the `security` role.
    fn security_metric(&self) -> &'static str;

    fn default_tools(&self) -> BTreeMap<ToolRole, String>;

    fn default_metrics(&self) -> MetricCatalog;

    fn parse_test_output(&self, output: &str) -> TestSummary {
        generic::parse_test_output(output)
    }

    fn parse_lint_output(&self, output: &str) -> LintSummary {
        generic::parse_lint_output(output)
    }

    fn parse_security_output(&self, output: &str) -> SecuritySummary {
        generic::parse_security_output(output)
    }

    fn parse_typecheck_output(&self, output: &str) -> TypecheckSummary {
        generic::parse_typecheck_output(output)
    }

    /// Output of the `dependencies` role, a vulnerability audit of the
    /// dependency tree.
    fn parse_dependency_audit(&self, output: &str) -> SecuritySummary {
        generic::parse_security_output(output)
    }

    fn extract_coverage(&self, output: &str) -> Option<f64> {
        coverage::extract_coverage(output)
    }

    /// Parser for a tool role. Format and build output carries no metrics.
    fn parse_output(&self, role: ToolRole, output: &str) -> Option<ParsedResult> {
        let parsed = match role {
            ToolRole::Test => ParsedResult::Test(self.parse_test_output(output)),
            ToolRole::Lint => ParsedResult::Lint(self.parse_lint_output(output)),
            ToolRole::Typecheck => ParsedResult::Typecheck(self.parse_typecheck_output(output)),
            ToolRole::Security => ParsedResult::Security(self.parse_security_output(output)),
            ToolRole::Dependencies => ParsedResult::Security(self.parse_dependency_audit(output)),
            ToolRole::Format | ToolRole::Build => return None,
        };
        Some(parsed)
    }

    fn complexity_rules(&self) -> ComplexityRules {
        complexity::GENERIC
    }

    fn function_syntax(&self) -> &FunctionSyntax {
        &function_length::GENERIC
    }

    fn extra_security_patterns(&self) -> &[SecurityPattern] {
        &[]
    }

    fn estimate_complexity(&self, source: &str) -> u32 {
        complexity::estimate(source, &self.complexity_rules())
    }

    fn count_functions(&self, source: &str) -> usize {
        function_length::function_spans(source, self.function_syntax()).len()
    }

    fn validate_function_length(
        &self,
        file_name: &str,
        source: &str,
        max_lines: usize,
    ) -> Vec<FunctionLengthViolation> {
        function_length::violations(file_name, source, self.function_syntax(), max_lines)
    }

    fn check_security_patterns(&self, source: &str) -> Vec<SecurityFinding> {
        patterns::scan(
            source,
            &[patterns::BASELINE.as_slice(), self.extra_security_patterns()],
        )
    }

    fn dependencies(&self, _project_root: &Path) -> Vec<String> {
        Vec::new()
    }

    fn project_files(&self, project_root: &Path) -> Vec<PathBuf> {
        filesystem::source_files(project_root, self.source_extensions())
    }

    fn probe_tool(&self, command: &ToolCommand) -> bool {
        ToolInvoker::default().probe(command)
    }

    fn run_tool(&self, command: &ToolCommand, working_dir: Option<&Path>) -> Result<ToolOutput> {
        ToolInvoker::default().invoke(command, working_dir)
    }
}

pub(crate) fn tool_table(entries: &[(ToolRole, &str)]) -> BTreeMap<ToolRole, String> {
    entries
        .iter()
        .map(|(role, command)| (*role, (*command).to_string()))
        .collect()
}
