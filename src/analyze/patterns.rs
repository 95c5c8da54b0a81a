//! Regex scan for insecure constructs in source text.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct SecurityPattern {
    pub kind: &'static str,
    pub severity: Severity,
    pub regex: Regex,
}

impl SecurityPattern {
    /// Patterns match case-insensitively with `^`/`$` anchored per line.
    pub fn new(kind: &'static str, severity: Severity, pattern: &str) -> Self {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .expect("security pattern should compile");
        Self {
            kind,
            severity,
            regex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub kind: String,
    pub matched: String,
    pub severity: Severity,
    /// 1-based line of the start of the match.
    pub line: usize,
}

pub static BASELINE: LazyLock<Vec<SecurityPattern>> = LazyLock::new(|| {
    vec![
        SecurityPattern::new(
            "hardcoded_secret",
            Severity::Medium,
            r#"(password|secret|key|token)\s*=\s*["'][^"']+["']"#,
        ),
        SecurityPattern::new(
            "sql_injection",
            Severity::High,
            r"(SELECT|INSERT|UPDATE|DELETE).*\+.*",
        ),
        SecurityPattern::new(
            "command_injection",
            Severity::High,
            r"(exec|eval|system)\s*\(",
        ),
        SecurityPattern::new("path_traversal", Severity::Medium, r"\.\./|\.\.\\"),
    ]
});

pub fn scan(source: &str, patterns: &[&[SecurityPattern]]) -> Vec<SecurityFinding> {
    let line_starts = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect::<Vec<_>>();
    let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset);

    let mut findings = patterns
        .iter()
        .flat_map(|set| set.iter())
        .flat_map(|pattern| {
            pattern.regex.find_iter(source).map(|found| SecurityFinding {
                kind: pattern.kind.to_string(),
                matched: found.as_str().to_string(),
                severity: pattern.severity,
                line: line_of(found.start()),
            })
        })
        .collect::<Vec<_>>();
    findings.sort_by(|a, b| a.line.cmp(&b.line).then(a.severity.cmp(&b.severity)));
    findings
}

pub fn count_high(findings: &[SecurityFinding]) -> usize {
    findings
        .iter()
        .filter(|finding| finding.severity == Severity::High)
        .count()
}
