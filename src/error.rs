use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("tool timed out after {timeout_secs}s: {command}")]
    ToolTimeout { command: String, timeout_secs: u64 },

    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("unknown project template: {0}")]
    UnknownTemplate(String),

    #[error("invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GateError {
    /// Tool failures are reported per tool instead of aborting a run.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            Self::ToolUnavailable(_) | Self::ToolTimeout { .. } | Self::ToolExecution(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
