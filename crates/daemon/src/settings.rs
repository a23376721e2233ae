//! Agent configuration
//!
//! Loaded from a TOML/YAML/JSON file and layered with `METERD__*`
//! environment overrides (e.g. `METERD__REFRESH_INTERVAL_SECS=10`).

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use meterd_infra_system::ModuleConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default pause between two on-demand refresh rounds (60s)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

const CONFIG_FILE_NAME: &str = "meterd.toml";

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl AgentConfig {
    /// Load from `path` (format by extension) plus environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("METERD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let agent: AgentConfig = settings
            .try_deserialize()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        agent.validate()?;
        Ok(agent)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be greater than 0");
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if !seen.insert(module.name.as_str()) {
                bail!("duplicate module name: {}", module.name);
            }
        }
        Ok(())
    }
}

/// `METERD_CONFIG`, else `<config dir>/meterd/meterd.toml`
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("METERD_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let dirs = ProjectDirs::from("", "", "meterd")
        .context("Could not determine a configuration directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}
