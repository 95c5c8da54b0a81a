//! Structured summaries extracted from raw tool output.
//!
//! Every parser here is total: empty or unrecognised output produces a
//! zero-valued summary instead of an error, so a silent tool reads as "no
//! activity" and the gates decide what that means.

pub mod coverage;
pub mod generic;
pub mod lint;
pub mod security;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub coverage: Option<f64>,
    pub duration_secs: Option<f64>,
    pub success: bool,
}

impl TestSummary {
    pub fn new(passed: usize, failed: usize, skipped: usize) -> Self {
        Self {
            passed,
            failed,
            skipped,
            total: passed + failed + skipped,
            coverage: None,
            duration_secs: None,
            success: failed == 0,
        }
    }

    pub fn with_coverage(mut self, coverage: Option<f64>) -> Self {
        self.coverage = coverage;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintSummary {
    pub errors: usize,
    pub warnings: usize,
    pub total_issues: usize,
    pub issues_by_type: BTreeMap<String, usize>,
    pub success: bool,
}

impl LintSummary {
    pub fn new(errors: usize, warnings: usize, issues_by_type: BTreeMap<String, usize>) -> Self {
        Self {
            errors,
            warnings,
            total_issues: errors + warnings,
            issues_by_type,
            success: errors == 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total_issues: usize,
    pub issues_by_type: BTreeMap<String, usize>,
    pub success: bool,
    /// Set when structured decoding failed and the line heuristic was used.
    pub degraded: bool,
}

impl SecuritySummary {
    pub fn new(high: usize, medium: usize, low: usize, issues_by_type: BTreeMap<String, usize>) -> Self {
        Self {
            high,
            medium,
            low,
            total_issues: high + medium + low,
            issues_by_type,
            success: high == 0,
            degraded: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypecheckSummary {
    pub errors: usize,
    pub warnings: usize,
    pub success: bool,
}

impl TypecheckSummary {
    pub fn new(errors: usize, warnings: usize) -> Self {
        Self {
            errors,
            warnings,
            success: errors == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum ParsedResult {
    Test(TestSummary),
    Lint(LintSummary),
    Security(SecuritySummary),
    Typecheck(TypecheckSummary),
}

impl ParsedResult {
    pub fn success(&self) -> bool {
        match self {
            Self::Test(summary) => summary.success,
            Self::Lint(summary) => summary.success,
            Self::Security(summary) => summary.success,
            Self::Typecheck(summary) => summary.success,
        }
    }
}

pub(crate) fn bump(counts: &mut BTreeMap<String, usize>, key: impl Into<String>) {
    *counts.entry(key.into()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_derive_totals_and_success() {
        let tests = TestSummary::new(5, 2, 1);
        assert_eq!(tests.total, 8);
        assert!(!tests.success);

        let lint = LintSummary::new(0, 3, BTreeMap::new());
        assert_eq!(lint.total_issues, 3);
        assert!(lint.success);

        let security = SecuritySummary::new(0, 4, 2, BTreeMap::new());
        assert!(security.success);
        assert_eq!(security.total_issues, 6);
    }

    #[test]
    fn parsed_result_serializes_with_category_tag() {
        let parsed = ParsedResult::Typecheck(TypecheckSummary::new(1, 0));
        let json = serde_json::to_string(&parsed).expect("should serialize");
        assert!(json.contains("\"category\":\"typecheck\""));
        assert!(!parsed.success());
    }
}
