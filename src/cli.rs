use crate::types::config::ToolRole;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "qualitygate",
    version,
    about = "Run language quality tools and judge the results against metric gates"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score the project against every template
    Detect(DetectCommand),
    /// Write a configuration document for the project
    Init(InitCommand),
    /// Show the loaded configuration and benchmark ledger
    Status(StatusCommand),
    /// Validate the configuration or probe the configured tools
    Check(CheckCommand),
    /// Print the merged configuration
    ExportConfig(ExportConfigCommand),
    /// Record a benchmark delta in the ledger
    Benchmark(BenchmarkCommand),
    /// Parse saved tool output with a language adapter
    Parse(ParseCommand),
    /// Judge one measurement against its configured policy
    Evaluate(EvaluateCommand),
    /// Run the configured tools and evaluate every gate
    Run(RunCommand),
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Json,
    Toml,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum CheckTarget {
    Tools,
    Config,
}

#[derive(Args)]
pub struct DetectCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct InitCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,
    /// Template name; detected when omitted
    #[arg(long)]
    pub project_type: Option<String>,
    #[arg(long)]
    pub project_name: Option<String>,
    /// Print the document instead of writing it
    #[arg(long)]
    pub dry_run: bool,
    /// Replace an existing document
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatusCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckCommand {
    #[arg(value_enum)]
    pub target: CheckTarget,
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExportConfigCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ConfigFormat,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct BenchmarkCommand {
    pub name: String,
    /// Signed percentage change from the baseline
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ParseCommand {
    /// test, lint, typecheck, security or dependencies
    pub category: ToolRole,
    /// Saved output; standard input when omitted
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "python")]
    pub language: String,
}

#[derive(Args)]
pub struct EvaluateCommand {
    pub metric: String,
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
    /// Restrict the policy lookup to one category
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Only judge these metric categories
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Explicit measurement, NAME=VALUE
    #[arg(long = "metric", value_parser = parse_measurement)]
    pub metrics: Vec<(String, f64)>,
    /// Also run the format and build roles
    #[arg(long)]
    pub with_build: bool,
    /// Judge only the static scan, ledger and explicit measurements
    #[arg(long)]
    pub no_tools: bool,
}

fn parse_measurement(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing metric name in {raw:?}"));
    }
    let value = value
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((name.to_string(), value))
}
