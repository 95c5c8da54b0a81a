//! Security and dependency-audit reports. When a JSON report cannot be
//! decoded, or a text report has no recognizable summary, the generic line
//! heuristic is used and the summary is marked `degraded`.

use super::{bump, generic, SecuritySummary};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static SAFETY_REPORTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+vulnerabilit(?:y|ies)\s+reported")
        .expect("safety summary pattern should compile")
});

static SAFETY_FOUND_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Vulnerability found in ([\w.\-]+)")
        .expect("safety finding pattern should compile")
});

static GOVULNCHECK_AFFECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"affected by (\d+) vulnerabilit")
        .expect("govulncheck summary pattern should compile")
});

static GO_VULN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Vulnerability #\d+: (GO-\d{4}-\d+)")
        .expect("go vulnerability id pattern should compile")
});

static DENY_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(error|warning)\[([\w-]+)\]")
        .expect("cargo deny diagnostic pattern should compile")
});

/// Decode a JSON object, tolerating log noise around it.
fn decode_object(output: &str) -> Option<Map<String, Value>> {
    let candidates = [
        Some(output.trim()),
        output
            .find('{')
            .zip(output.rfind('}'))
            .filter(|(start, end)| start < end)
            .map(|(start, end)| &output[start..=end]),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|text| match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}

fn degraded(scanner: &str, output: &str) -> SecuritySummary {
    debug!(scanner, "structured security report not decodable, using line heuristic");
    let mut summary = generic::parse_security_output(output);
    summary.degraded = true;
    summary
}

fn count(value: Option<&Value>) -> usize {
    value
        .and_then(|value| value.as_u64().or_else(|| value.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0) as usize
}

/// bandit `-f json`: `metrics._totals["SEVERITY.*"]` plus `results[].test_id`.
pub fn parse_bandit(output: &str) -> SecuritySummary {
    let Some(report) = decode_object(output) else {
        return degraded("bandit", output);
    };

    let totals = report.get("metrics").and_then(|metrics| metrics.get("_totals"));
    let severity = |key: &str| count(totals.and_then(|totals| totals.get(key)));

    let mut by_type = BTreeMap::new();
    if let Some(results) = report.get("results").and_then(Value::as_array) {
        for result in results {
            let test_id = result
                .get("test_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            bump(&mut by_type, test_id);
        }
    }

    SecuritySummary::new(
        severity("SEVERITY.HIGH"),
        severity("SEVERITY.MEDIUM"),
        severity("SEVERITY.LOW"),
        by_type,
    )
}

/// `npm audit --json` (npm 7+): `metadata.vulnerabilities` totals and the
/// `vulnerabilities` map keyed by package name.
pub fn parse_npm_audit(output: &str) -> SecuritySummary {
    let Some(report) = decode_object(output) else {
        return degraded("npm audit", output);
    };

    let totals = report
        .get("metadata")
        .and_then(|metadata| metadata.get("vulnerabilities"));
    let severity = |key: &str| count(totals.and_then(|totals| totals.get(key)));

    let mut by_type = BTreeMap::new();
    if let Some(packages) = report.get("vulnerabilities").and_then(Value::as_object) {
        for (name, advisory) in packages {
            let level = advisory
                .get("severity")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            by_type.insert(name.clone(), 1);
            debug!(package = %name, severity = level, "npm audit finding");
        }
    }

    SecuritySummary::new(
        severity("critical") + severity("high"),
        severity("moderate"),
        severity("low") + severity("info"),
        by_type,
    )
}

/// gosec `-fmt=json`: `Issues[].severity` and `Issues[].rule_id`.
pub fn parse_gosec(output: &str) -> SecuritySummary {
    let Some(report) = decode_object(output) else {
        return degraded("gosec", output);
    };

    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;
    let mut by_type = BTreeMap::new();

    if let Some(issues) = report.get("Issues").and_then(Value::as_array) {
        for issue in issues {
            match issue
                .get("severity")
                .and_then(Value::as_str)
                .map(str::to_uppercase)
                .as_deref()
            {
                Some("HIGH") => high += 1,
                Some("MEDIUM") => medium += 1,
                _ => low += 1,
            }
            let rule = issue
                .get("rule_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            bump(&mut by_type, rule);
        }
    }

    SecuritySummary::new(high, medium, low, by_type)
}

/// `cargo audit --json`: every vulnerability blocks; unmaintained, yanked
/// and unsound warnings are informational.
pub fn parse_cargo_audit(output: &str) -> SecuritySummary {
    let Some(report) = decode_object(output) else {
        return degraded("cargo audit", output);
    };

    let mut by_type = BTreeMap::new();
    let vulnerabilities = report
        .get("vulnerabilities")
        .and_then(|vulns| vulns.get("list"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for vulnerability in vulnerabilities {
        let id = vulnerability
            .get("advisory")
            .and_then(|advisory| advisory.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        bump(&mut by_type, id);
    }

    let mut warnings = 0;
    if let Some(kinds) = report.get("warnings").and_then(Value::as_object) {
        for (kind, entries) in kinds {
            let entries = entries.as_array().map(Vec::len).unwrap_or(0);
            if entries > 0 {
                by_type.insert(kind.clone(), entries);
                warnings += entries;
            }
        }
    }

    SecuritySummary::new(vulnerabilities.len(), 0, warnings, by_type)
}

/// `safety check` text report. Every known vulnerability blocks.
pub fn parse_safety(output: &str) -> SecuritySummary {
    let mut by_type = BTreeMap::new();
    for caps in SAFETY_FOUND_IN.captures_iter(output) {
        bump(&mut by_type, &caps[1]);
    }
    let listed = by_type.values().sum::<usize>();
    let reported = SAFETY_REPORTED
        .captures(output)
        .and_then(|caps| caps[1].parse::<usize>().ok());

    match reported {
        Some(reported) => SecuritySummary::new(reported.max(listed), 0, 0, by_type),
        None if listed > 0 => SecuritySummary::new(listed, 0, 0, by_type),
        None if output.contains("No known security vulnerabilities") => {
            SecuritySummary::new(0, 0, 0, by_type)
        }
        None => degraded("safety", output),
    }
}

/// govulncheck text summary: `Your code is affected by N vulnerabilities`.
pub fn parse_govulncheck(output: &str) -> SecuritySummary {
    let mut by_type = BTreeMap::new();
    for caps in GO_VULN_ID.captures_iter(output) {
        by_type.insert(caps[1].to_string(), 1);
    }
    if let Some(caps) = GOVULNCHECK_AFFECTED.captures(output) {
        let affected = caps[1].parse().unwrap_or(by_type.len());
        return SecuritySummary::new(affected, 0, 0, by_type);
    }
    if output.contains("No vulnerabilities found") {
        return SecuritySummary::new(0, 0, 0, BTreeMap::new());
    }
    degraded("govulncheck", output)
}

/// `cargo deny check` diagnostics: `error[code]` blocks, `warning[code]`
/// does not.
pub fn parse_cargo_deny(output: &str) -> SecuritySummary {
    let mut high = 0;
    let mut low = 0;
    let mut by_type = BTreeMap::new();
    for caps in DENY_DIAGNOSTIC.captures_iter(output) {
        if &caps[1] == "error" {
            high += 1;
        } else {
            low += 1;
        }
        bump(&mut by_type, &caps[2]);
    }
    SecuritySummary::new(high, 0, low, by_type)
}
