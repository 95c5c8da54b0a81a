use crate::pipeline::RunReport;

pub fn to_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn json_report_carries_gates_and_tool_statuses() {
        let rendered = to_json(&fixtures::report()).expect("json should serialize");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json should parse");
        assert_eq!(value["project_name"], "demo");
        assert_eq!(value["tools"][0]["status"], "passed");
        assert_eq!(value["tools"][1]["status"], "unavailable");
        assert_eq!(value["tools"][1]["role"], "security");
        assert_eq!(value["measurements"]["test_coverage"], 91.5);
        let results = value["gates"]["results"].as_array().expect("results array");
        assert_eq!(results.len(), 2);
        assert!(rendered.contains("\"reason\": \"unmeasured\""));
    }
}
