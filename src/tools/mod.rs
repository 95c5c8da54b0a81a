pub mod command;
pub mod invoke;

pub use command::{ToolCommand, ToolSpec};
pub use invoke::{ToolInvoker, ToolOutput, PROBE_TIMEOUT, RUN_TIMEOUT};
