//! Benchmark ledger at `ci/BENCH_SUMMARY.txt`: a single line of signed
//! percentage deltas, `BENCH: execution_time:-6.2% memory_usage:+1.0%`.

use crate::error::{GateError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const LEDGER_PATH: &str = "ci/BENCH_SUMMARY.txt";
const PREFIX: &str = "BENCH:";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    /// In the order metrics were first recorded.
    pub entries: Vec<(String, f64)>,
}

impl Ledger {
    pub fn parse(text: &str) -> Self {
        let Some(body) = text
            .lines()
            .find_map(|line| line.trim().strip_prefix(PREFIX))
        else {
            return Self::default();
        };

        let entries = body
            .split_whitespace()
            .filter_map(|token| {
                let (name, value) = token.rsplit_once(':')?;
                let value = value.trim_end_matches('%').parse::<f64>();
                match value {
                    Ok(value) if !name.is_empty() => Some((name.to_string(), value)),
                    _ => {
                        debug!(token, "skipping malformed ledger entry");
                        None
                    }
                }
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| *value)
    }

    /// Replace `name` in place, or append it.
    pub fn set(&mut self, name: &str, value: f64) {
        match self.entries.iter_mut().find(|(entry, _)| entry == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn render(&self) -> String {
        let mut line = PREFIX.to_string();
        for (name, value) in &self.entries {
            line.push_str(&format!(" {name}:{value:+.1}%"));
        }
        line
    }

    pub fn measurements(&self) -> BTreeMap<String, f64> {
        self.entries.iter().cloned().collect()
    }
}

pub fn ledger_path(root: &Path) -> PathBuf {
    root.join(LEDGER_PATH)
}

pub fn read_ledger(root: &Path) -> Result<Ledger> {
    let path = ledger_path(root);
    if !path.exists() {
        return Ok(Ledger::default());
    }
    Ok(Ledger::parse(&fs::read_to_string(path)?))
}

pub fn record(root: &Path, name: &str, value: f64) -> Result<Ledger> {
    if name.trim().is_empty() || name.contains(char::is_whitespace) || name.contains(':') {
        return Err(GateError::InvalidMeasurement(format!(
            "benchmark name must be a single word without ':': {name:?}"
        )));
    }
    if !value.is_finite() {
        return Err(GateError::InvalidMeasurement(format!(
            "benchmark {name} must be a finite number"
        )));
    }

    let mut ledger = read_ledger(root)?;
    ledger.set(name, value);

    let path = ledger_path(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, format!("{}\n", ledger.render()))?;
    info!(metric = name, value, path = %path.display(), "recorded benchmark");
    Ok(ledger)
}

pub fn ledger_measurements(root: &Path) -> Result<BTreeMap<String, f64>> {
    Ok(read_ledger(root)?.measurements())
}
