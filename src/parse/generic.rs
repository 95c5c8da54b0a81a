//! Line-keyword fallbacks used when no format-aware parser applies.

use super::coverage::extract_coverage;
use super::{LintSummary, SecuritySummary, TestSummary, TypecheckSummary};
use std::collections::BTreeMap;

pub fn parse_test_output(output: &str) -> TestSummary {
    let passed = output
        .lines()
        .filter(|line| line.contains("PASS") || line.contains('✓'))
        .count();
    let failed = output
        .lines()
        .filter(|line| line.contains("FAIL") || line.contains('✗'))
        .count();

    TestSummary::new(passed, failed, 0).with_coverage(extract_coverage(output))
}

pub fn parse_lint_output(output: &str) -> LintSummary {
    let (errors, warnings) = count_errors_and_warnings(output);
    LintSummary::new(errors, warnings, BTreeMap::new())
}

pub fn parse_typecheck_output(output: &str) -> TypecheckSummary {
    let (errors, warnings) = count_errors_and_warnings(output);
    TypecheckSummary::new(errors, warnings)
}

pub fn parse_security_output(output: &str) -> SecuritySummary {
    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;

    for line in output.lines().map(str::to_lowercase) {
        if !(line.contains("severity") || line.contains("risk")) {
            continue;
        }
        if line.contains("high") {
            high += 1;
        }
        if line.contains("medium") {
            medium += 1;
        }
        if line.contains("low") {
            low += 1;
        }
    }

    SecuritySummary::new(high, medium, low, BTreeMap::new())
}

fn count_errors_and_warnings(output: &str) -> (usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;
    for line in output.lines().map(str::to_lowercase) {
        if line.contains("error") {
            errors += 1;
        }
        if line.contains("warning") {
            warnings += 1;
        }
    }
    (errors, warnings)
}
