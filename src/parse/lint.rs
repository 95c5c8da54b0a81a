//! Linter and type-checker output.

use super::{bump, generic, LintSummary, TypecheckSummary};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static LOCATED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[^:\s][^:]*:\d+:\d+:\s+([A-Z]+\d+)\b")
        .expect("located code pattern should compile")
});

// ruff `--output-format=grouped`: rows indented under a `path:` heading.
static GROUPED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+\d+:\d+:?\s+([A-Z]+\d+)\b").expect("grouped code pattern should compile")
});

static ESLINT_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+\d+:\d+\s+(error|warning)\s+.*?(?:\s{2,}(\S+))?\s*$")
        .expect("eslint row pattern should compile")
});

static ESLINT_TOTALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) problems? \((\d+) errors?, (\d+) warnings?\)")
        .expect("eslint totals pattern should compile")
});

static GOLANGCI_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+\.go:\d+(?::\d+)?:\s+.*\(([\w-]+)\)\s*$")
        .expect("golangci row pattern should compile")
});

static RUSTC_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(error|warning)(?:\[(\w+)\])?: (.+)$")
        .expect("rustc diagnostic pattern should compile")
});

static RUSTC_LINT_NOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\[(?:warn|deny|forbid)\(([\w:]+)\)\]")
        .expect("rustc lint note pattern should compile")
});

static MYPY_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Found (\d+) errors? in").expect("mypy summary pattern should compile")
});

static TSC_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"error TS\d+:").expect("tsc error pattern should compile")
});

static TSC_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Found (\d+) errors?").expect("tsc summary pattern should compile")
});

static GO_VET_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:vet: )?\S+\.go:\d+(?::\d+)?: ").expect("go vet row pattern should compile")
});

const GOLANGCI_ERROR_LINTERS: [&str; 5] = ["typecheck", "govet", "staticcheck", "errcheck", "gosec"];

/// `file:line:col: CODE message` rows, or `line:col CODE message` rows of
/// grouped output. Codes elsewhere on a line are not counted. Codes whose
/// leading letter is in `fatal_prefixes` are errors; the rest are warnings.
pub fn parse_located_codes(output: &str, fatal_prefixes: &[char]) -> LintSummary {
    let mut errors = 0;
    let mut warnings = 0;
    let mut by_type = BTreeMap::new();

    for line in output.lines() {
        let Some(caps) = LOCATED_CODE
            .captures(line)
            .or_else(|| GROUPED_CODE.captures(line))
        else {
            continue;
        };
        let code = &caps[1];
        bump(&mut by_type, code);
        if code.starts_with(fatal_prefixes) {
            errors += 1;
        } else {
            warnings += 1;
        }
    }

    LintSummary::new(errors, warnings, by_type)
}

/// ESLint "stylish" output. The `✖ N problems` footer wins over row counts.
pub fn parse_eslint(output: &str) -> LintSummary {
    let mut errors = 0;
    let mut warnings = 0;
    let mut by_type = BTreeMap::new();

    for line in output.lines() {
        let Some(caps) = ESLINT_ROW.captures(line) else {
            continue;
        };
        if &caps[1] == "error" {
            errors += 1;
        } else {
            warnings += 1;
        }
        let rule = caps.get(2).map(|rule| rule.as_str()).unwrap_or("unclassified");
        bump(&mut by_type, rule);
    }

    if let Some(caps) = ESLINT_TOTALS.captures(output) {
        errors = caps[2].parse().unwrap_or(errors);
        warnings = caps[3].parse().unwrap_or(warnings);
    }

    if errors + warnings == 0 && by_type.is_empty() {
        return generic::parse_lint_output(output);
    }
    LintSummary::new(errors, warnings, by_type)
}

/// golangci-lint rows end in `(linter)`; correctness linters are errors.
pub fn parse_golangci(output: &str) -> LintSummary {
    let mut errors = 0;
    let mut warnings = 0;
    let mut by_type = BTreeMap::new();

    for line in output.lines() {
        let Some(caps) = GOLANGCI_ROW.captures(line) else {
            continue;
        };
        let linter = &caps[1];
        bump(&mut by_type, linter);
        if GOLANGCI_ERROR_LINTERS.iter().any(|name| *name == linter) {
            errors += 1;
        } else {
            warnings += 1;
        }
    }

    LintSummary::new(errors, warnings, by_type)
}

/// rustc/clippy human diagnostics. Lint names come from the
/// `#[warn(..)]` note that follows a warning; build summaries are skipped.
pub fn parse_clippy(output: &str) -> LintSummary {
    let mut errors = 0;
    let mut warnings = 0;
    let mut by_type = BTreeMap::new();
    let mut pending_warning = false;

    for line in output.lines() {
        if let Some(caps) = RUSTC_DIAGNOSTIC.captures(line) {
            if pending_warning {
                bump(&mut by_type, "unclassified");
                pending_warning = false;
            }
            let message = &caps[3];
            if is_rustc_summary(message) {
                continue;
            }
            if &caps[1] == "error" {
                errors += 1;
                bump(&mut by_type, caps.get(2).map_or("error", |code| code.as_str()));
            } else {
                warnings += 1;
                pending_warning = true;
            }
            continue;
        }

        if pending_warning {
            if let Some(caps) = RUSTC_LINT_NOTE.captures(line) {
                bump(&mut by_type, &caps[1]);
                pending_warning = false;
            }
        }
    }
    if pending_warning {
        bump(&mut by_type, "unclassified");
    }

    LintSummary::new(errors, warnings, by_type)
}

fn is_rustc_summary(message: &str) -> bool {
    message.starts_with("aborting due to")
        || message.starts_with("could not compile")
        || message.contains(" generated ")
        || message.starts_with("build failed")
        || message.starts_with("Compilation failed")
}

pub fn parse_mypy(output: &str) -> TypecheckSummary {
    let mut errors = output.lines().filter(|line| line.contains(": error:")).count();
    let warnings = output
        .lines()
        .filter(|line| line.contains(": warning:"))
        .count();
    if let Some(caps) = MYPY_FOUND.captures(output) {
        errors = caps[1].parse().unwrap_or(errors);
    }
    TypecheckSummary::new(errors, warnings)
}

pub fn parse_tsc(output: &str) -> TypecheckSummary {
    let mut errors = output.lines().filter(|line| TSC_ERROR.is_match(line)).count();
    if let Some(caps) = TSC_FOUND.captures(output) {
        errors = caps[1].parse().unwrap_or(errors);
    }
    TypecheckSummary::new(errors, 0)
}

/// `go vet` reports every finding as `file.go:line:col: message`.
pub fn parse_go_vet(output: &str) -> TypecheckSummary {
    let errors = output.lines().filter(|line| GO_VET_ROW.is_match(line)).count();
    TypecheckSummary::new(errors, 0)
}
