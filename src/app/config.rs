use crate::app::cli::Cli;
use crate::app::models::{ModuleConfig, Palette, PathSpec};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Instance used when `--instance` is not given.
pub const DEFAULT_INSTANCE: &str = "file_status";

#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    #[serde(default)]
    colors: Palette,
    #[serde(flatten)]
    instances: HashMap<String, ModuleConfig>,
}

/// Configuration after merging the config file with CLI flags.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub instance: String,
    pub module: ModuleConfig,
    pub palette: Palette,
}

fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home
        .join(".config")
        .join("file_status")
        .join("config.toml"))
}

fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(ConfigFile::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&config_path)
        .context(format!("Failed to read config at {:?}", config_path))?;

    parse_config_file(&content).context(format!("Failed to parse {:?}", config_path))
}

fn parse_config_file(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Appends CLI paths to the file's, dropping duplicates but keeping order.
fn merge_paths(file_path: Option<PathSpec>, cli_paths: Option<Vec<String>>) -> Option<PathSpec> {
    let Some(mut cli_paths) = cli_paths else {
        return file_path;
    };
    let mut combined = file_path.map(PathSpec::into_vec).unwrap_or_default();
    combined.append(&mut cli_paths);

    let mut seen = std::collections::HashSet::new();
    combined.retain(|item| seen.insert(item.clone()));
    Some(PathSpec::Many(combined))
}

fn resolve(file: ConfigFile, cli: &Cli) -> Result<ResolvedConfig> {
    let ConfigFile {
        colors,
        mut instances,
    } = file;

    let instance = cli.instance.as_deref().unwrap_or(DEFAULT_INSTANCE);
    let base = match instances.remove(instance) {
        Some(module) => module,
        None if cli.instance.is_some() => bail!("No instance named {:?} in config", instance),
        None => ModuleConfig::default(),
    };

    let module = ModuleConfig {
        path: merge_paths(base.path, cli.path.clone()),
        format: cli.format.clone().or(base.format),
        format_path: cli.format_path.clone().or(base.format_path),
        format_path_separator: cli
            .format_path_separator
            .clone()
            .or(base.format_path_separator),
        cache_timeout: cli.cache_timeout.or(base.cache_timeout),
        ..base
    };

    Ok(ResolvedConfig {
        instance: instance.to_string(),
        module,
        palette: colors,
    })
}

pub fn resolve_config(cli: &Cli) -> Result<ResolvedConfig> {
    let file = load_config_file(cli.config.as_deref())?;
    resolve(file, cli)
}
