pub mod json;
pub mod md;

use crate::error::Result;
use crate::pipeline::RunReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

pub fn render(report: &RunReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(json::to_json(report)?),
        OutputFormat::Md => Ok(md::to_markdown(report)),
    }
}
