//! Shared command setup: config + snapshot loading with CLI overrides.

use std::path::PathBuf;

use anyhow::Result;

use crate::adapter::LanguageVersion;
use crate::cli::args::CommonArgs;
use crate::config::{Config, load_config};
use crate::engine::PassOptions;
use crate::snapshot::ProjectSnapshot;

/// Everything a command needs to run a pass.
pub struct LoadedProject {
    pub config: Config,
    pub snapshot: ProjectSnapshot,
    pub options: PassOptions,
    /// Root for config lookup and for resolving written file paths.
    pub root: PathBuf,
}

/// Load configuration and the project snapshot, applying CLI overrides
/// (CLI args > config file > defaults).
pub fn load_project(common: &CommonArgs, verbose: bool) -> Result<LoadedProject> {
    let root = common
        .source_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let config_result = load_config(&root)?;
    if verbose && !config_result.from_file {
        eprintln!("Note: No .autoproprc.json found, using default configuration");
    }
    let config = config_result.config;

    let snapshot_path = match &common.snapshot {
        Some(path) => path.clone(),
        None => {
            let p = PathBuf::from(&config.snapshot_path);
            if p.is_absolute() { p } else { root.join(p) }
        }
    };
    let mut snapshot = ProjectSnapshot::load(&snapshot_path)?;

    if let Some(version) = config.language_version {
        snapshot.language_version = LanguageVersion(version);
    }

    let severity = common
        .severity
        .map(Into::into)
        .unwrap_or(config.severity);
    let options = PassOptions {
        severity: Some(severity),
        ignore: config.ignore_patterns(),
    };

    Ok(LoadedProject {
        config,
        snapshot,
        options,
        root,
    })
}
