use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const SHELL_OPERATORS: [&str; 8] = ["&&", "||", "|", ";", ">", ">>", "<", "&"];

/// A tool as written in the configuration document.
///
/// The string form is split on whitespace with no quoting support, which is
/// what existing documents rely on. The array form is taken verbatim, so an
/// argument may contain spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Line(String),
    Argv(Vec<String>),
}

impl ToolSpec {
    pub fn to_command(&self) -> Result<ToolCommand> {
        match self {
            Self::Line(line) => ToolCommand::parse(line),
            Self::Argv(argv) => ToolCommand::from_argv(argv.clone()),
        }
    }
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => f.write_str(line),
            Self::Argv(argv) => f.write_str(&argv.join(" ")),
        }
    }
}

impl From<&str> for ToolSpec {
    fn from(line: &str) -> Self {
        Self::Line(line.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace().map(ToString::to_string);
        let program = tokens
            .next()
            .ok_or_else(|| GateError::ToolExecution("empty command line".to_string()))?;
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn from_argv(argv: Vec<String>) -> Result<Self> {
        let mut tokens = argv.into_iter();
        let program = tokens
            .next()
            .filter(|program| !program.trim().is_empty())
            .ok_or_else(|| GateError::ToolExecution("empty command line".to_string()))?;
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    /// The `--version` probe used to check that the executable exists.
    pub fn version_probe(&self) -> Self {
        Self {
            program: self.program.clone(),
            args: vec!["--version".to_string()],
        }
    }

    /// Shell operators are not interpreted; they reach the tool as literal
    /// arguments.
    pub fn shell_operators(&self) -> Vec<&str> {
        self.args
            .iter()
            .map(String::as_str)
            .filter(|arg| SHELL_OPERATORS.iter().any(|operator| operator == arg))
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_any_whitespace() {
        let command = ToolCommand::parse("  pytest   --cov=.\ttests/ ").expect("command should parse");
        assert_eq!(command.program, "pytest");
        assert_eq!(command.args, vec!["--cov=.", "tests/"]);
    }

    #[test]
    fn parse_does_not_honour_quotes() {
        let command =
            ToolCommand::parse(r#"semgrep --config "p/owasp top ten""#).expect("command should parse");
        assert_eq!(command.args.len(), 4);
        assert_eq!(command.args[1], "\"p/owasp");
    }

    #[test]
    fn parse_rejects_blank_line() {
        assert!(matches!(
            ToolCommand::parse("   "),
            Err(GateError::ToolExecution(_))
        ));
    }

    #[test]
    fn argv_spec_keeps_arguments_with_spaces() {
        let spec: ToolSpec =
            serde_json::from_str(r#"["semgrep", "--config", "p/owasp top ten"]"#).expect("argv spec");
        let command = spec.to_command().expect("command should build");
        assert_eq!(command.args, vec!["--config", "p/owasp top ten"]);
    }

    #[test]
    fn shell_operators_are_reported() {
        let command =
            ToolCommand::parse("bandit -r src/ && safety check").expect("command should parse");
        assert_eq!(command.shell_operators(), vec!["&&"]);
        assert!(ToolCommand::parse("cargo test")
            .expect("command should parse")
            .shell_operators()
            .is_empty());
    }

    #[test]
    fn version_probe_replaces_arguments() {
        let command = ToolCommand::parse("go test ./...").expect("command should parse");
        assert_eq!(command.version_probe().to_string(), "go --version");
    }
}
