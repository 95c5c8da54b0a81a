use crate::error::{GateError, Result};
use crate::types::config::OrchestratorConfig;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = ".claude/orchestrator.json";
pub const DEFAULT_LOCAL_FILE: &str = ".claude/orchestrator.local.json";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/qualitygate/config.json";

/// `explicit` replaces the repo document; the global and local layers still
/// apply around it.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Option<OrchestratorConfig>> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, explicit, global.as_deref())
}

pub fn require_config(root: &Path, explicit: Option<&Path>) -> Result<OrchestratorConfig> {
    load_config(root, explicit)?.ok_or_else(|| {
        GateError::ConfigNotFound(repo_config_path(root, explicit).display().to_string())
    })
}

pub fn repo_config_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE))
}

pub(crate) fn load_config_with_global(
    root: &Path,
    explicit: Option<&Path>,
    global_path: Option<&Path>,
) -> Result<Option<OrchestratorConfig>> {
    let repo_path = repo_config_path(root, explicit);
    if !repo_path.exists() {
        if explicit.is_some() {
            return Err(GateError::ConfigNotFound(repo_path.display().to_string()));
        }
        debug!(path = %repo_path.display(), "no configuration document");
        return Ok(None);
    }

    let mut merged = Value::Object(Map::new());
    if let Some(path) = global_path {
        merge_file_if_exists(&mut merged, path)?;
    }
    merge_file_if_exists(&mut merged, &repo_path)?;
    merge_file_if_exists(&mut merged, &root.join(DEFAULT_LOCAL_FILE))?;

    let cfg: OrchestratorConfig = serde_json::from_value(merged)
        .map_err(|e| GateError::ConfigParse(format!("{}: {}", repo_path.display(), e)))?;
    cfg.validate()?;
    Ok(Some(cfg))
}

fn merge_file_if_exists(merged: &mut Value, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let value = read_json_value(path)?;
    merge_json(merged, value);
    debug!(path = %path.display(), "merged configuration layer");
    Ok(())
}

fn read_json_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| GateError::ConfigParse(format!("{}: {}", path.display(), e)))
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => {
            *slot = value;
        }
    }
}

pub fn to_json(config: &OrchestratorConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

pub fn to_toml(config: &OrchestratorConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// Writes the repo document, creating `.claude/` as needed.
pub fn write_config(
    root: &Path,
    explicit: Option<&Path>,
    config: &OrchestratorConfig,
) -> Result<PathBuf> {
    config.validate()?;
    let path = repo_config_path(root, explicit);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, format!("{}\n", to_json(config)?))?;
    info!(path = %path.display(), "wrote configuration");
    Ok(path)
}
