use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use trackhub_api::Settings;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub entity: Option<String>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

/// The directory holding CLI config and testserver state.
pub fn trackhub_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".trackhub");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(trackhub_dir()?.join("config.toml"))
}

pub fn load_all() -> Result<ConfigFile> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    let cfg: ConfigFile = toml::from_str(&content)?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all()?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: ProfileConfig) -> Result<()> {
    let mut all = load_all()?;
    all.insert(profile.to_string(), config);
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path()?, content)?;
    Ok(())
}

pub fn resolve_server(cli_server: &Option<String>, profile: &str) -> Result<String> {
    // 1. --server flag / TRACKHUB_BASE_URL env
    if let Some(server) = cli_server {
        return Ok(server.clone());
    }
    // 2. config.toml profile
    let cfg = load_profile(profile)?;
    if let Some(server) = cfg.server {
        return Ok(server);
    }
    anyhow::bail!(
        "No server URL configured. Use --server, set TRACKHUB_BASE_URL, or run: trackhub config set server <url>"
    )
}

/// Assemble client settings from the flag/env/profile chain. The API key
/// only ever comes from the environment.
pub fn resolve_settings(cli_server: &Option<String>, profile: &str) -> Result<Settings> {
    let server = resolve_server(cli_server, profile)?;
    let cfg = load_profile(profile)?;

    let mut settings = Settings::new(server);
    if let Ok(api_key) = std::env::var("TRACKHUB_API_KEY") {
        settings = settings.with_api_key(api_key);
    }
    if let Some(entity) = cfg.entity {
        settings = settings.with_entity(entity);
    }
    Ok(settings)
}
