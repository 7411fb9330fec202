//! Configuration file handling.
//!
//! The config file is JSON. It lives in the platform config directory
//! unless `--config` points elsewhere.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use svcaudit_observe::SrvctlConfig;
use svcaudit_reconcile::SourceMode;

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "svcaudit", "svcaudit")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Oracle home exported to `srvctl`.
    #[serde(default = "default_oracle_home")]
    pub oracle_home: Option<PathBuf>,

    /// Explicit path to `srvctl`. Defaults to `<oracle_home>/bin/srvctl`.
    #[serde(default)]
    pub srvctl_path: Option<PathBuf>,

    /// Extra environment for every `srvctl` invocation.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub source_mode: SourceMode,
}

fn default_oracle_home() -> Option<PathBuf> {
    std::env::var_os("SVCAUDIT_ORACLE_HOME")
        .or_else(|| std::env::var_os("ORACLE_HOME"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

fn default_command_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle_home: default_oracle_home(),
            srvctl_path: None,
            env: BTreeMap::new(),
            command_timeout_secs: default_command_timeout_secs(),
            source_mode: SourceMode::default(),
        }
    }
}

impl Config {
    /// Load config from the default location, or return defaults.
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Resolve the `srvctl` program path.
    pub fn srvctl_program(&self) -> PathBuf {
        match (&self.srvctl_path, &self.oracle_home) {
            (Some(path), _) => path.clone(),
            (None, Some(home)) => home.join("bin").join("srvctl"),
            (None, None) => PathBuf::from("srvctl"),
        }
    }

    /// Settings for the `srvctl` observer.
    pub fn srvctl_config(&self) -> SrvctlConfig {
        SrvctlConfig {
            program: self.srvctl_program(),
            oracle_home: self.oracle_home.clone(),
            env: self.env.clone(),
            timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }
}
