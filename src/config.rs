//! Configuration file loading and parsing.
//!
//! Configuration priority (highest to lowest): CLI arguments, the
//! `.autoproprc.json` config file, built-in defaults.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Severity;

pub const CONFIG_FILE_NAME: &str = ".autoproprc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Severity of the use-auto-property diagnostic.
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// `Type.field` labels to suppress, as glob patterns.
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Override the snapshot's language version, e.g. to preview behavior
    /// under an older compiler.
    #[serde(default)]
    pub language_version: Option<u32>,
    /// Default snapshot path used when the CLI does not pass one.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

fn default_severity() -> Severity {
    Severity::Warning
}

fn default_snapshot_path() -> String {
    "./autoprop.snapshot.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            severity: default_severity(),
            ignores: Vec::new(),
            language_version: None,
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `ignores` is invalid.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }
        Ok(())
    }

    /// Compile the ignore patterns. Call after `validate`.
    pub fn ignore_patterns(&self) -> Vec<Pattern> {
        self.ignores
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect()
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

/// Load configuration from `start_dir`, falling back to defaults when no
/// config file is found.
pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    let Some(config_path) = find_config_file(start_dir) else {
        return Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        });
    };

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;
    config.validate()?;

    Ok(ConfigLoadResult {
        config,
        from_file: true,
    })
}
