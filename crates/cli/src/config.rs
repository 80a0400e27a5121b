use anyhow::{bail, Context, Result};
use rulify_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// CLI configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Engine settings; any key given here overrides the environment.
    #[serde(default)]
    pub engine: Option<toml::Table>,
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/rulify/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("rulify");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            debug!(?config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        debug!(?config_path, "Loading config");
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", config_path.display()))
    }

    /// Overlay the `[engine]` table on `base`. The profile of `base` is kept.
    pub fn engine_config(&self, base: EngineConfig) -> Result<EngineConfig> {
        let Some(overrides) = &self.engine else {
            return Ok(base);
        };

        let toml::Value::Table(mut table) =
            toml::Value::try_from(&base).context("failed to serialize engine config")?
        else {
            bail!("engine config did not serialize to a table");
        };
        table.extend(overrides.clone());

        let mut merged: EngineConfig = toml::Value::Table(table)
            .try_into()
            .context("invalid [engine] settings")?;
        merged.profile = base.profile;
        Ok(merged)
    }
}
