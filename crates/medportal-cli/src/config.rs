use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use medportal_client::{AuthMode, ClientConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
    pub auth_mode: Option<AuthMode>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".medportal");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

pub fn load_all(dir: &Path) -> Result<ConfigFile> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(dir: &Path, profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all(dir)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(dir: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all(dir)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path(dir), content)?;
    Ok(())
}

/// Applies `key = value` to a profile.
pub fn set_key(cfg: &mut ProfileConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "server" => cfg.server = Some(value.to_string()),
        "format" => match value {
            "json" | "yaml" | "table" => cfg.format = Some(value.to_string()),
            other => anyhow::bail!("Unknown format: {other}. Valid formats: json, yaml, table"),
        },
        "auth_mode" => cfg.auth_mode = Some(value.parse()?),
        other => {
            anyhow::bail!("Unknown config key: {other}. Valid keys: server, format, auth_mode")
        }
    }
    Ok(())
}

/// Resolves the client configuration for a profile.
///
/// The server comes from `--server` / `MEDPORTAL_URL`, then the profile. The
/// auth mode comes from `--auth-mode`, then the profile, then the default.
pub fn resolve_client(
    cli_server: Option<&str>,
    cli_mode: Option<AuthMode>,
    profile_cfg: &ProfileConfig,
) -> Result<ClientConfig> {
    let server = cli_server
        .map(str::to_string)
        .or_else(|| profile_cfg.server.clone())
        .context(
            "No server URL configured. Use --server, set MEDPORTAL_URL env var, or run: medportal config set server <url>",
        )?;
    let mode = cli_mode.or(profile_cfg.auth_mode).unwrap_or_default();

    let config = ClientConfig::parse(&server)
        .with_context(|| format!("Invalid server URL: {server}"))?
        .with_auth_mode(mode);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = ProfileConfig::default();
        set_key(&mut cfg, "server", "https://portal.test/api").unwrap();
        set_key(&mut cfg, "auth_mode", "cookie").unwrap();
        set_key(&mut cfg, "format", "yaml").unwrap();
        save_profile(dir.path(), "staging", &cfg).unwrap();

        let loaded = load_profile(dir.path(), "staging").unwrap();
        assert_eq!(loaded.server.as_deref(), Some("https://portal.test/api"));
        assert_eq!(loaded.auth_mode, Some(AuthMode::Cookie));
        assert_eq!(loaded.format.as_deref(), Some("yaml"));
        assert!(load_profile(dir.path(), "default").unwrap().server.is_none());
    }

    #[test]
    fn test_set_key_rejects_unknown() {
        let mut cfg = ProfileConfig::default();
        assert!(set_key(&mut cfg, "colour", "blue").is_err());
        assert!(set_key(&mut cfg, "format", "xml").is_err());
        assert!(set_key(&mut cfg, "auth_mode", "basic").is_err());
    }

    #[test]
    fn test_resolve_client_precedence() {
        let profile = ProfileConfig {
            server: Some("https://profile.test".into()),
            format: None,
            auth_mode: Some(AuthMode::Cookie),
        };

        let cfg = resolve_client(None, None, &profile).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://profile.test/");
        assert_eq!(cfg.auth_mode, AuthMode::Cookie);

        let cfg =
            resolve_client(Some("https://flag.test"), Some(AuthMode::Bearer), &profile).unwrap();
        assert_eq!(cfg.base_url.host_str(), Some("flag.test"));
        assert_eq!(cfg.auth_mode, AuthMode::Bearer);

        assert!(resolve_client(None, None, &ProfileConfig::default()).is_err());
    }
}
