use crate::pipeline::{RunReport, ToolStatus};

fn status_label(status: &ToolStatus) -> String {
    match status {
        ToolStatus::Passed => "passed".to_string(),
        ToolStatus::Failed { exit_code: Some(code) } => format!("failed (exit {code})"),
        ToolStatus::Failed { exit_code: None } => "failed (signal)".to_string(),
        ToolStatus::Skipped { reason } => format!("skipped: {reason}"),
        ToolStatus::Unavailable => "unavailable".to_string(),
        ToolStatus::TimedOut { timeout_secs } => format!("timed out after {timeout_secs}s"),
        ToolStatus::Error { message } => format!("error: {message}"),
    }
}

pub fn to_markdown(report: &RunReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("# Quality Report: {}\n\n", report.project_name));
    output.push_str(&format!(
        "Language: {}\nGenerated: {}\nVerdict: {}\n\n",
        report.language,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if report.accepted() { "ACCEPTED" } else { "BLOCKED" }
    ));

    output.push_str("## Tools\n\n");
    if report.tools.is_empty() {
        output.push_str("- none\n\n");
    } else {
        for run in &report.tools {
            output.push_str(&format!(
                "- {} `{}`: {}",
                run.role,
                run.command,
                status_label(&run.status)
            ));
            if let Some(ms) = run.duration_ms {
                output.push_str(&format!(" in {ms} ms"));
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output.push_str("## Static Scan\n\n");
    output.push_str(&format!(
        "- files: {}\n- functions: {}\n- max complexity: {}\n- long functions: {}\n- pattern findings: {} ({} high)\n\n",
        report.scan.files,
        report.scan.functions,
        report
            .scan
            .max_complexity
            .map_or_else(|| "n/a".to_string(), |max| max.to_string()),
        report.scan.violations.len(),
        report.scan.findings.len(),
        report.scan.high_findings()
    ));
    for violation in &report.scan.violations {
        output.push_str(&format!("- {violation}\n"));
    }
    for scan in &report.scan.findings {
        output.push_str(&format!(
            "- [{}] {}:{} {}\n",
            scan.finding.severity, scan.file, scan.finding.line, scan.finding.kind
        ));
    }
    if !report.scan.violations.is_empty() || !report.scan.findings.is_empty() {
        output.push('\n');
    }

    output.push_str("## Gates\n\n");
    if report.gates.results.is_empty() {
        output.push_str("- none\n");
    } else {
        for result in &report.gates.results {
            output.push_str(&format!(
                "- [{}] {}.{}: {}\n",
                if result.verdict.pass { "pass" } else { "FAIL" },
                result.category,
                result.metric,
                result.verdict.reason
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn markdown_report_contains_sections() {
        let rendered = to_markdown(&fixtures::report());
        assert!(rendered.contains("# Quality Report: demo"));
        assert!(rendered.contains("Verdict: BLOCKED"));
        assert!(rendered.contains("Generated: 2026-10-14 09:30:00 UTC"));
        assert!(rendered.contains("- test `pytest --cov=. tests/`: passed in 1200 ms"));
        assert!(rendered.contains("- security `bandit -r . -f json`: unavailable"));
        assert!(rendered.contains("- max complexity: 4"));
        assert!(rendered.contains("- [pass] quality.test_coverage: 91.5% meets target 80%"));
        assert!(rendered.contains("- [FAIL] quality.model_accuracy: unmeasured"));
    }
}
