use clap::Parser;
use qualitygate::cli::{self, CheckTarget, Commands, ConfigFormat, ReportFormat};
use qualitygate::error::{GateError, Result};
use qualitygate::types::config::OrchestratorConfig;
use qualitygate::{adapters, bench, config, gate, pipeline, report, scan, templates};
use std::io::Read;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const WARNINGS: i32 = 1;
    pub const BLOCKING: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("qualitygate={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(GateError::PathNotFound(path.display().to_string()))
    }
}

/// The loaded document, or the detected template's document when the
/// project has none yet.
fn config_or_detected(path: &Path, explicit: Option<&Path>) -> Result<OrchestratorConfig> {
    if let Some(cfg) = config::load_config(path, explicit)? {
        return Ok(cfg);
    }
    let classification = scan::classify(path)?;
    let template = match classification.template() {
        Some(template) => template,
        None => templates::require(templates::DEFAULT_TEMPLATE)?,
    };
    eprintln!(
        "warning: no {} found in {}; using detected template {}",
        config::DEFAULT_CONFIG_FILE,
        path.display(),
        template.name
    );
    Ok(templates::create_config(template, path, None))
}

fn run() -> Result<i32> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Detect(cmd) => {
            let classification = scan::classify(&cmd.path)?;
            match cmd.format {
                ReportFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&classification)?)
                }
                ReportFormat::Md => {
                    println!("project type: {}", classification.template);
                    for score in &classification.scores {
                        let mut signals = score.indicators.clone();
                        if score.keyword_hit {
                            signals.push("manifest keyword".to_string());
                        }
                        println!("- {}: {} [{}]", score.template, score.score, signals.join(", "));
                    }
                }
            }
            Ok(exit_code::SUCCESS)
        }
        Commands::Init(cmd) => {
            require_dir(&cmd.path)?;
            let template = match cmd.project_type.as_deref() {
                Some(name) => templates::require(name)?,
                None => match scan::classify(&cmd.path)?.template() {
                    Some(template) => template,
                    None => templates::require(templates::DEFAULT_TEMPLATE)?,
                },
            };
            let cfg = templates::create_config(template, &cmd.path, cmd.project_name.as_deref());

            if cmd.dry_run {
                println!("{}", config::to_json(&cfg)?);
                return Ok(exit_code::SUCCESS);
            }

            let target = config::repo_config_path(&cmd.path, cmd.config.as_deref());
            if target.exists() && !cmd.force {
                eprintln!(
                    "warning: {} already exists; pass --force to replace it",
                    target.display()
                );
                return Ok(exit_code::WARNINGS);
            }
            let written = config::write_config(&cmd.path, cmd.config.as_deref(), &cfg)?;
            println!("init: wrote {} ({})", written.display(), template.name);
            Ok(exit_code::SUCCESS)
        }
        Commands::Status(cmd) => {
            require_dir(&cmd.path)?;
            let Some(cfg) = config::load_config(&cmd.path, cmd.config.as_deref())? else {
                println!(
                    "status: no {} in {}",
                    config::DEFAULT_CONFIG_FILE,
                    cmd.path.display()
                );
                return Ok(exit_code::WARNINGS);
            };

            println!("project: {} ({})", cfg.project_name, cfg.project_type);
            println!("language: {}", cfg.language);
            if let Some(version) = &cfg.orchestrator_version {
                println!("written by: qualitygate {version}");
            }
            println!("tools:");
            for (role, spec) in cfg.tool_roles() {
                println!("- {role}: {spec}");
            }
            let policies = cfg.metrics.values().map(|metrics| metrics.len()).sum::<usize>();
            println!("metrics: {policies} in {} categories", cfg.metrics.len());
            let ledger = bench::read_ledger(&cmd.path)?;
            if ledger.entries.is_empty() {
                println!("benchmarks: none recorded");
            } else {
                println!("benchmarks: {}", ledger.render());
            }
            Ok(exit_code::SUCCESS)
        }
        Commands::Check(cmd) => {
            require_dir(&cmd.path)?;
            match cmd.target {
                CheckTarget::Config => {
                    let cfg = config::require_config(&cmd.path, cmd.config.as_deref())?;
                    if !adapters::is_known_language(&cfg.language) {
                        println!(
                            "config: language {:?} is not one of {}",
                            cfg.language,
                            adapters::known_languages().join(", ")
                        );
                        return Ok(exit_code::WARNINGS);
                    }
                    println!(
                        "config: valid ({} tools, {} metric categories)",
                        cfg.tools.len(),
                        cfg.metrics.len()
                    );
                    Ok(exit_code::SUCCESS)
                }
                CheckTarget::Tools => {
                    let cfg = config_or_detected(&cmd.path, cmd.config.as_deref())?;
                    let adapter = adapters::resolve(&cfg.language);
                    let mut missing = 0;
                    for (role, spec) in cfg.tool_roles() {
                        let command = spec.to_command()?;
                        if adapter.probe_tool(&command) {
                            println!("[ok] {role}: {}", command.program);
                        } else {
                            missing += 1;
                            println!("[missing] {role}: {}", command.program);
                        }
                    }
                    if missing > 0 {
                        Ok(exit_code::WARNINGS)
                    } else {
                        Ok(exit_code::SUCCESS)
                    }
                }
            }
        }
        Commands::ExportConfig(cmd) => {
            require_dir(&cmd.path)?;
            let cfg = config_or_detected(&cmd.path, cmd.config.as_deref())?;
            let rendered = match cmd.format {
                ConfigFormat::Json => config::to_json(&cfg)?,
                ConfigFormat::Toml => config::to_toml(&cfg)?,
            };
            println!("{rendered}");
            Ok(exit_code::SUCCESS)
        }
        Commands::Benchmark(cmd) => {
            require_dir(&cmd.path)?;
            let ledger = bench::record(&cmd.path, &cmd.name, cmd.value)?;
            println!("{}", ledger.render());
            Ok(exit_code::SUCCESS)
        }
        Commands::Parse(cmd) => {
            let output = match &cmd.file {
                Some(file) => {
                    if !file.is_file() {
                        return Err(GateError::PathNotFound(file.display().to_string()));
                    }
                    std::fs::read_to_string(file)?
                }
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            if !adapters::is_known_language(&cmd.language) {
                warn!(language = %cmd.language, "unknown language, using closest adapter");
            }
            let adapter = adapters::resolve(&cmd.language);
            let Some(parsed) = adapter.parse_output(cmd.category, &output) else {
                eprintln!("parse: {} output carries no metrics", cmd.category);
                return Ok(exit_code::WARNINGS);
            };
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            if parsed.success() {
                Ok(exit_code::SUCCESS)
            } else {
                Ok(exit_code::WARNINGS)
            }
        }
        Commands::Evaluate(cmd) => {
            require_dir(&cmd.path)?;
            let cfg = config_or_detected(&cmd.path, cmd.config.as_deref())?;
            let found = cfg
                .metrics
                .iter()
                .filter(|(category, _)| cmd.category.as_ref().map_or(true, |wanted| wanted == *category))
                .find_map(|(category, policies)| {
                    policies.get(&cmd.metric).map(|policy| (category, policy))
                });
            let Some((category, policy)) = found else {
                return Err(GateError::InvalidMeasurement(format!(
                    "no policy configured for metric {}",
                    cmd.metric
                )));
            };

            let verdict = gate::evaluate(cmd.value, policy);
            println!(
                "{} {category}.{}: {} (delta {:+})",
                if verdict.pass { "PASS" } else { "FAIL" },
                cmd.metric,
                verdict.reason,
                verdict.delta
            );
            if verdict.pass {
                Ok(exit_code::SUCCESS)
            } else {
                Ok(exit_code::BLOCKING)
            }
        }
        Commands::Run(cmd) => {
            require_dir(&cmd.path)?;
            let cfg = config_or_detected(&cmd.path, cmd.config.as_deref())?;
            let options = pipeline::RunOptions {
                categories: cmd.categories,
                overrides: cmd.metrics.into_iter().collect(),
                include_mutating: cmd.with_build,
                skip_tools: cmd.no_tools,
            };
            let run_report = pipeline::run(&cmd.path, &cfg, &options)?;

            let output_format = match cmd.format {
                ReportFormat::Json => report::OutputFormat::Json,
                ReportFormat::Md => report::OutputFormat::Md,
            };
            println!("{}", report::render(&run_report, output_format)?);

            if !run_report.accepted() {
                Ok(exit_code::BLOCKING)
            } else if run_report.tool_problems() > 0 {
                Ok(exit_code::WARNINGS)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
