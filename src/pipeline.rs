//! Runs the configured tools, measures the tree, and judges the results.

use crate::adapters::{self, LanguageAdapter};
use crate::analyze::{scan_project, ProjectScan};
use crate::bench;
use crate::error::{GateError, Result};
use crate::gate::{self, GateReport};
use crate::parse::ParsedResult;
use crate::tools::ToolSpec;
use crate::types::config::{OrchestratorConfig, ToolRole};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const METRIC_TEST_COVERAGE: &str = "test_coverage";
pub const METRIC_TEST_FAILURES: &str = "test_failures";
pub const METRIC_LINT_ERRORS: &str = "lint_errors";
pub const METRIC_LINT_WARNINGS: &str = "lint_warnings";
pub const METRIC_TYPECHECK_ERRORS: &str = "typecheck_errors";
pub const METRIC_DEPENDENCY_VULNERABILITIES: &str = "dependency_vulnerabilities";
pub const METRIC_COMPLEXITY: &str = "cyclomatic_complexity";
pub const METRIC_FUNCTION_LENGTH: &str = "function_length_violations";
pub const METRIC_PATTERN_HIGH: &str = "security_pattern_high";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Metric categories to judge; empty judges all of them.
    pub categories: Vec<String>,
    /// Explicit measurements, applied last.
    pub overrides: BTreeMap<String, f64>,
    /// Also run the roles that rewrite or compile the tree.
    pub include_mutating: bool,
    /// Judge only the static scan, ledger and overrides.
    pub skip_tools: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    Passed,
    Failed { exit_code: Option<i32> },
    Skipped { reason: String },
    Unavailable,
    TimedOut { timeout_secs: u64 },
    Error { message: String },
}

impl ToolStatus {
    fn from_error(err: &GateError) -> Self {
        match err {
            GateError::ToolUnavailable(_) => Self::Unavailable,
            GateError::ToolTimeout { timeout_secs, .. } => Self::TimedOut {
                timeout_secs: *timeout_secs,
            },
            other => Self::Error {
                message: other.to_string(),
            },
        }
    }

    /// The tool did not produce a result to judge.
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::TimedOut { .. } | Self::Error { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRun {
    pub role: ToolRole,
    pub command: String,
    #[serde(flatten)]
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub language: String,
    pub tools: Vec<ToolRun>,
    pub scan: ProjectScan,
    pub measurements: BTreeMap<String, f64>,
    pub gates: GateReport,
}

impl RunReport {
    pub fn accepted(&self) -> bool {
        self.gates.accepted()
    }

    pub fn tool_problems(&self) -> usize {
        self.tools.iter().filter(|run| run.status.is_problem()).count()
    }
}

/// Measurements a parsed tool result contributes.
pub fn measurements_from(
    adapter: &dyn LanguageAdapter,
    role: ToolRole,
    parsed: &ParsedResult,
) -> Vec<(String, f64)> {
    let mut values = Vec::new();
    match (role, parsed) {
        (_, ParsedResult::Test(summary)) => {
            if let Some(coverage) = summary.coverage {
                values.push((METRIC_TEST_COVERAGE.to_string(), coverage));
            }
            values.push((METRIC_TEST_FAILURES.to_string(), summary.failed as f64));
        }
        (_, ParsedResult::Lint(summary)) => {
            values.push((METRIC_LINT_ERRORS.to_string(), summary.errors as f64));
            values.push((METRIC_LINT_WARNINGS.to_string(), summary.warnings as f64));
        }
        (_, ParsedResult::Typecheck(summary)) => {
            values.push((METRIC_TYPECHECK_ERRORS.to_string(), summary.errors as f64));
        }
        (ToolRole::Dependencies, ParsedResult::Security(summary)) => {
            values.push((
                METRIC_DEPENDENCY_VULNERABILITIES.to_string(),
                summary.high as f64,
            ));
        }
        (_, ParsedResult::Security(summary)) => {
            values.push((adapter.security_metric().to_string(), summary.high as f64));
        }
    }
    values
}

pub fn scan_measurements(scan: &ProjectScan) -> Vec<(String, f64)> {
    let mut values = vec![
        (
            METRIC_FUNCTION_LENGTH.to_string(),
            scan.violations.len() as f64,
        ),
        (METRIC_PATTERN_HIGH.to_string(), scan.high_findings() as f64),
    ];
    if let Some(max) = scan.max_complexity {
        values.push((METRIC_COMPLEXITY.to_string(), f64::from(max)));
    }
    values
}

fn run_role(
    adapter: &dyn LanguageAdapter,
    root: &Path,
    role: ToolRole,
    spec: &ToolSpec,
    options: &RunOptions,
) -> ToolRun {
    let mut run = ToolRun {
        role,
        command: spec.to_string(),
        status: ToolStatus::Passed,
        duration_ms: None,
        parsed: None,
    };

    if options.skip_tools {
        run.status = ToolStatus::Skipped {
            reason: "tools disabled".to_string(),
        };
        return run;
    }
    if role.mutates_tree() && !options.include_mutating {
        run.status = ToolStatus::Skipped {
            reason: "rewrites or builds the tree; pass --with-build".to_string(),
        };
        return run;
    }

    let output = match spec
        .to_command()
        .and_then(|command| adapter.run_tool(&command, Some(root)))
    {
        Ok(output) => output,
        Err(err) => {
            warn!(role = %role, command = %run.command, error = %err, "tool did not run");
            run.status = ToolStatus::from_error(&err);
            return run;
        }
    };
    run.duration_ms = Some(output.duration_ms);

    // JSON reports go to stdout; keep stderr noise out of the decoder.
    let text = match role {
        ToolRole::Security | ToolRole::Dependencies if !output.stdout.trim().is_empty() => {
            output.stdout.clone()
        }
        _ => output.combined(),
    };
    run.parsed = adapter.parse_output(role, &text);

    let parsed_ok = run.parsed.as_ref().map_or(true, ParsedResult::success);
    run.status = if parsed_ok && output.success() {
        ToolStatus::Passed
    } else {
        ToolStatus::Failed {
            exit_code: output.exit_code,
        }
    };
    info!(role = %role, status = ?run.status, "tool finished");
    run
}

/// Tools run one at a time in role order; a tool that cannot start is
/// recorded and the run continues.
pub fn run(root: &Path, config: &OrchestratorConfig, options: &RunOptions) -> Result<RunReport> {
    if !root.is_dir() {
        return Err(GateError::PathNotFound(root.display().to_string()));
    }
    let adapter = adapters::resolve(&config.language);
    info!(project = %config.project_name, language = adapter.language(), "starting quality run");

    let roles: Vec<(ToolRole, ToolSpec)> = if config.tools.is_empty() {
        adapter
            .default_tools()
            .into_iter()
            .map(|(role, command)| (role, ToolSpec::Line(command)))
            .collect()
    } else {
        config
            .tool_roles()
            .into_iter()
            .map(|(role, spec)| (role, spec.clone()))
            .collect()
    };

    let mut measurements = BTreeMap::new();
    let mut tools = Vec::with_capacity(roles.len());
    for (role, spec) in &roles {
        let run = run_role(adapter.as_ref(), root, *role, spec, options);
        if let Some(parsed) = &run.parsed {
            measurements.extend(measurements_from(adapter.as_ref(), *role, parsed));
        }
        tools.push(run);
    }

    let scan = scan_project(adapter.as_ref(), root, config.standards.max_function_lines)?;
    measurements.extend(scan_measurements(&scan));
    measurements.extend(bench::ledger_measurements(root)?);
    measurements.extend(options.overrides.clone());

    let metrics = if config.metrics.is_empty() {
        adapter.default_metrics()
    } else {
        config.metrics.clone()
    };
    let gates = gate::evaluate_all(&metrics, &measurements, &options.categories);
    info!(
        gates = gates.results.len(),
        accepted = gates.accepted(),
        "quality run complete"
    );

    Ok(RunReport {
        project_name: config.project_name.clone(),
        generated_at: Utc::now(),
        language: adapter.language().to_string(),
        tools,
        scan,
        measurements,
        gates,
    })
}
