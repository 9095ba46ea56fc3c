//! YAML run configuration.
//!
//! Mirrors the keys of `config.yaml`: where the dataset lives, where
//! results go, and which image single-image mode operates on. NLM
//! parameters never live here; they are command line arguments passed
//! explicitly into the core.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths for a denoising run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Root of the dataset tree: one subdirectory per group, images inside.
    pub data_path: PathBuf,

    /// Directory denoised images are written to.
    pub save_path: PathBuf,

    /// Image processed by single-image mode.
    #[serde(default)]
    pub single_image: Option<PathBuf>,
}

/// Load a run configuration from disk.
pub fn load(path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse(contents: &str) -> Result<RunConfig> {
    Ok(serde_yaml::from_str(contents)?)
}
