//! Turns measured values into pass/fail verdicts against metric policies.

use crate::types::config::{Direction, MetricCatalog, MetricPolicy};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub pass: bool,
    /// Signed distance from the target, positive on the favorable side.
    pub delta: f64,
    pub reason: String,
}

impl Verdict {
    fn new(pass: bool, delta: f64, reason: impl Into<String>) -> Self {
        Self {
            pass,
            delta,
            reason: reason.into(),
        }
    }
}

fn fmt_value(value: f64, unit: &str) -> String {
    match unit {
        "%" => format!("{value}%"),
        "" => value.to_string(),
        unit => format!("{value} {unit}"),
    }
}

/// Absolute policies compare `measured` with the target. Relative policies
/// take `measured` as a signed percentage change from a baseline; the cap
/// bounds the unfavorable side. An absolute cap is always an upper bound.
pub fn evaluate(measured: f64, policy: &MetricPolicy) -> Verdict {
    if !measured.is_finite() {
        return Verdict::new(false, 0.0, format!("measurement {measured} is not finite"));
    }

    let direction = policy.effective_direction();
    let delta = match direction {
        Direction::HigherIsBetter => measured - policy.target,
        Direction::LowerIsBetter => policy.target - measured,
    };
    let shown = fmt_value(measured, &policy.unit);
    let target = fmt_value(policy.target, &policy.unit);

    if let Some(cap) = policy.cap {
        let beyond_cap = if policy.absolute {
            measured > cap
        } else {
            match direction {
                Direction::HigherIsBetter => measured < cap,
                Direction::LowerIsBetter => measured > cap,
            }
        };
        if beyond_cap {
            let cap = fmt_value(cap, &policy.unit);
            return Verdict::new(false, delta, format!("{shown} exceeds cap {cap}"));
        }
    }

    if delta < 0.0 {
        let wanted = match direction {
            Direction::HigherIsBetter => "at least",
            Direction::LowerIsBetter => "at most",
        };
        return Verdict::new(false, delta, format!("{shown} misses target ({wanted} {target})"));
    }

    Verdict::new(true, delta, format!("{shown} meets target {target}"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    pub category: String,
    pub metric: String,
    pub policy: MetricPolicy,
    pub measured: Option<f64>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GateReport {
    pub results: Vec<GateResult>,
}

impl GateReport {
    /// No partial credit: one failing gate blocks acceptance.
    pub fn accepted(&self) -> bool {
        self.results.iter().all(|result| result.verdict.pass)
    }

    pub fn failures(&self) -> impl Iterator<Item = &GateResult> {
        self.results.iter().filter(|result| !result.verdict.pass)
    }

    pub fn measured_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.measured.is_some())
            .count()
    }
}

/// One result per policy in `metrics`, restricted to `categories` when it is
/// non-empty. A policy with no measurement fails as `unmeasured`.
pub fn evaluate_all(
    metrics: &MetricCatalog,
    measurements: &BTreeMap<String, f64>,
    categories: &[String],
) -> GateReport {
    let results = metrics
        .iter()
        .filter(|(category, _)| categories.is_empty() || categories.contains(category))
        .flat_map(|(category, policies)| {
            policies.iter().map(move |(metric, policy)| {
                let measured = measurements.get(metric).copied();
                let verdict = match measured {
                    Some(value) => evaluate(value, policy),
                    None => Verdict::new(false, 0.0, "unmeasured"),
                };
                GateResult {
                    category: category.clone(),
                    metric: metric.clone(),
                    policy: policy.clone(),
                    measured,
                    verdict,
                }
            })
        })
        .collect();
    GateReport { results }
}
