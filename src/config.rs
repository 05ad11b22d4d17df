//! Layered configuration: defaults, then the config file, then the environment.
//! Command-line flags are applied last by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::matcher::MatchMode;
use crate::synth::Numbering;

const APP_NAME: &str = "beaverdam";
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming the vault base directory.
pub const VAULT_DIR_ENV: &str = "AGENTIC_ETC";

/// Vault base directory when [`VAULT_DIR_ENV`] is unset.
pub const FALLBACK_VAULT_DIR: &str = "/tmp/agentic_etc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamConfig {
    /// Directory holding the card and archive directories.
    pub root: PathBuf,
    /// Card directory, relative to `root` unless absolute.
    pub cards_dir: PathBuf,
    /// Archive directory, relative to `root` unless absolute.
    pub vaults_dir: PathBuf,
    /// Where `beaver_passwords.secure` is written.
    pub vault_base_dir: PathBuf,
    pub match_mode: MatchMode,
    pub numbering: Numbering,
    /// Optional YAML registry replacing the built-in catalog.
    pub catalog: Option<PathBuf>,
}

impl Default for DamConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".dams").join("fortress"),
            cards_dir: PathBuf::from("work_cards"),
            vaults_dir: PathBuf::from("milestone_vaults"),
            vault_base_dir: PathBuf::from(FALLBACK_VAULT_DIR),
            match_mode: MatchMode::default(),
            numbering: Numbering::default(),
            catalog: None,
        }
    }
}

impl DamConfig {
    /// Load from `path`, or from the user config directory when `path` is `None`.
    ///
    /// A missing default config file yields the defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let Some(path) = default_config_path() else {
                    return Ok(Self::default());
                };
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::read(&path)
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(VAULT_DIR_ENV).filter(|d| !d.is_empty()) {
            self.vault_base_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn cards_path(&self) -> PathBuf {
        self.root.join(&self.cards_dir)
    }

    pub fn vaults_path(&self) -> PathBuf {
        self.root.join(&self.vaults_dir)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let mut path = config_dir()?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Some(path)
}
