use crate::error::GateError;
use crate::tools::command::ToolSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// category -> metric name -> policy
pub type MetricCatalog = BTreeMap<String, BTreeMap<String, MetricPolicy>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorConfig {
    pub project_name: String,
    #[serde(default)]
    pub project_type: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_version: Option<String>,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolSpec>,
    #[serde(default)]
    pub metrics: MetricCatalog,
    #[serde(default)]
    pub gates: BTreeMap<String, String>,
    #[serde(default)]
    pub standards: Standards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolRole {
    Test,
    Lint,
    Format,
    Typecheck,
    Security,
    Dependencies,
    Build,
}

impl ToolRole {
    pub const ALL: [ToolRole; 7] = [
        Self::Test,
        Self::Lint,
        Self::Format,
        Self::Typecheck,
        Self::Security,
        Self::Dependencies,
        Self::Build,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Lint => "lint",
            Self::Format => "format",
            Self::Typecheck => "typecheck",
            Self::Security => "security",
            Self::Dependencies => "dependencies",
            Self::Build => "build",
        }
    }

    /// Roles that rewrite or compile the tree rather than measure it.
    pub fn mutates_tree(self) -> bool {
        matches!(self, Self::Format | Self::Build)
    }
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolRole {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| GateError::ConfigParse(format!("unknown tool role: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "higher", alias = "higher_is_better", alias = "at_least")]
    HigherIsBetter,
    #[serde(rename = "lower", alias = "lower_is_better", alias = "at_most")]
    LowerIsBetter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricPolicy {
    pub target: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub absolute: bool,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl MetricPolicy {
    pub fn relative(target: f64, cap: f64) -> Self {
        Self {
            target,
            cap: Some(cap),
            absolute: false,
            unit: "%".to_string(),
            direction: None,
        }
    }

    pub fn absolute(target: f64, unit: &str) -> Self {
        Self {
            target,
            cap: None,
            absolute: true,
            unit: unit.to_string(),
            direction: None,
        }
    }

    pub fn at_most(mut self) -> Self {
        self.direction = Some(Direction::LowerIsBetter);
        self
    }

    /// Absolute policies default to meet-or-exceed. Relative policies are
    /// read from the cap: a cap above the target bounds a regression upwards.
    pub fn effective_direction(&self) -> Direction {
        if let Some(direction) = self.direction {
            return direction;
        }
        if self.absolute {
            return Direction::HigherIsBetter;
        }
        match self.cap {
            Some(cap) if cap < self.target => Direction::HigherIsBetter,
            _ => Direction::LowerIsBetter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Standards {
    #[serde(default = "default_max_function_lines")]
    pub max_function_lines: usize,
    #[serde(default = "default_test_coverage")]
    pub test_coverage: f64,
    #[serde(default = "default_security_level")]
    pub security_level: String,
    #[serde(default)]
    pub documentation_required: bool,
}

fn default_max_function_lines() -> usize {
    30
}

fn default_test_coverage() -> f64 {
    80.0
}

fn default_security_level() -> String {
    "no-high".to_string()
}

impl Default for Standards {
    fn default() -> Self {
        Self {
            max_function_lines: default_max_function_lines(),
            test_coverage: default_test_coverage(),
            security_level: default_security_level(),
            documentation_required: false,
        }
    }
}

impl OrchestratorConfig {
    pub fn tool_roles(&self) -> Vec<(ToolRole, &ToolSpec)> {
        let mut roles = self
            .tools
            .iter()
            .filter_map(|(role, spec)| role.parse::<ToolRole>().ok().map(|role| (role, spec)))
            .collect::<Vec<_>>();
        roles.sort_by_key(|(role, _)| *role);
        roles
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if self.project_name.trim().is_empty() {
            return Err(GateError::ConfigParse(
                "project_name must not be empty".to_string(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(GateError::ConfigParse(
                "language must not be empty".to_string(),
            ));
        }

        for (role, spec) in &self.tools {
            role.parse::<ToolRole>()?;
            if spec.to_command().is_err() {
                return Err(GateError::ConfigParse(format!(
                    "tools.{role} must name an executable"
                )));
            }
        }

        for (category, metrics) in &self.metrics {
            for (name, policy) in metrics {
                if !policy.target.is_finite() {
                    return Err(GateError::ConfigParse(format!(
                        "metrics.{category}.{name}.target must be a finite number"
                    )));
                }
                if policy.cap.is_some_and(|cap| !cap.is_finite()) {
                    return Err(GateError::ConfigParse(format!(
                        "metrics.{category}.{name}.cap must be a finite number"
                    )));
                }
            }
        }

        if self.standards.max_function_lines == 0 {
            return Err(GateError::ConfigParse(
                "standards.max_function_lines must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_document() {
        let json = r#"{"project_name": "demo", "language": "python"}"#;
        let cfg: OrchestratorConfig = serde_json::from_str(json).expect("minimal doc should parse");
        assert_eq!(cfg.project_name, "demo");
        assert!(cfg.tools.is_empty());
        assert_eq!(cfg.standards.max_function_lines, 30);
    }

    #[test]
    fn parse_full_document() {
        let json = r#"{
            "project_name": "svc",
            "project_type": "api",
            "language": "python",
            "tools": {
                "test": "pytest --cov=. tests/",
                "lint": ["ruff", "check", "."]
            },
            "metrics": {
                "performance": {
                    "response_time": {"target": -5, "cap": 10, "unit": "%"}
                },
                "quality": {
                    "test_coverage": {"target": 80, "absolute": true, "unit": "%"},
                    "cyclomatic_complexity": {"target": 10, "absolute": true, "unit": "max", "direction": "lower"}
                }
            },
            "gates": {"test": "All tests pass"},
            "standards": {"max_function_lines": 40}
        }"#;

        let cfg: OrchestratorConfig = serde_json::from_str(json).expect("full doc should parse");
        assert_eq!(cfg.tool_roles().len(), 2);
        assert_eq!(cfg.standards.max_function_lines, 40);
        let quality = &cfg.metrics["quality"];
        assert!(quality["test_coverage"].absolute);
        assert_eq!(
            quality["cyclomatic_complexity"].effective_direction(),
            Direction::LowerIsBetter
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn relative_direction_follows_cap() {
        assert_eq!(
            MetricPolicy::relative(-5.0, 15.0).effective_direction(),
            Direction::LowerIsBetter
        );
        assert_eq!(
            MetricPolicy::relative(5.0, -10.0).effective_direction(),
            Direction::HigherIsBetter
        );
        assert_eq!(
            MetricPolicy::absolute(80.0, "%").effective_direction(),
            Direction::HigherIsBetter
        );
    }

    #[test]
    fn direction_aliases_parse() {
        let cases = [
            ("higher", Direction::HigherIsBetter),
            ("higher_is_better", Direction::HigherIsBetter),
            ("at_least", Direction::HigherIsBetter),
            ("lower", Direction::LowerIsBetter),
            ("lower_is_better", Direction::LowerIsBetter),
            ("at_most", Direction::LowerIsBetter),
        ];
        for (alias, expected) in cases {
            // Relative with cap above target would read lower-is-better on its own.
            let json = format!(r#"{{"target": 5, "cap": 10, "direction": "{alias}"}}"#);
            let policy: MetricPolicy = serde_json::from_str(&json).expect("policy should parse");
            assert_eq!(policy.direction, Some(expected), "{alias}");
            assert_eq!(policy.effective_direction(), expected, "{alias}");
        }
        assert!(serde_json::from_str::<MetricPolicy>(r#"{"target": 1, "direction": "sideways"}"#).is_err());
    }

    #[test]
    fn validate_rejects_unknown_tool_role() {
        let json = r#"{"project_name": "demo", "language": "go", "tools": {"deploy": "make deploy"}}"#;
        let cfg: OrchestratorConfig = serde_json::from_str(json).expect("doc should parse");
        let err = cfg.validate().expect_err("validation should fail");
        assert!(err.to_string().contains("unknown tool role"));
    }

    #[test]
    fn validate_rejects_blank_command() {
        let json = r#"{"project_name": "demo", "language": "go", "tools": {"lint": "   "}}"#;
        let cfg: OrchestratorConfig = serde_json::from_str(json).expect("doc should parse");
        let err = cfg.validate().expect_err("validation should fail");
        assert!(err.to_string().contains("tools.lint must name an executable"));
    }

    #[test]
    fn tool_role_parses_case_insensitively() {
        assert_eq!("Security".parse::<ToolRole>().ok(), Some(ToolRole::Security));
        assert!("deploy".parse::<ToolRole>().is_err());
    }
}
