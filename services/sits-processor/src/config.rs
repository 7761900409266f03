//! Processor configuration.
//!
//! Loaded from one YAML file naming the coverage service, the workspace,
//! the reference land-cover datasets and the external algorithms.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use sits_pipeline::LandCoverDataset;
use tracing::debug;

/// Root of the YAML configuration file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub wcs: WcsConfig,
    /// Root directory of the per-process workspaces
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub land_cover: Vec<LandCoverDataset>,
    #[serde(default)]
    pub algorithms: Vec<AlgorithmConfig>,
}

/// Coverage service endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WcsConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Timeout of one whole request, body included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WcsConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    600
}

impl WcsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// External algorithm run as a child process.
#[derive(Debug, Clone, Deserialize)]
pub struct AlgorithmConfig {
    pub name: String,
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProcessorConfig {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ProcessorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(
            path = %path.display(),
            land_cover = config.land_cover.len(),
            algorithms = config.algorithms.len(),
            "Loaded processor config"
        );
        Ok(config)
    }

    /// Land-cover dataset by identifier or title; the first one when no
    /// name is given.
    pub fn land_cover_dataset(&self, name: Option<&str>) -> Result<&LandCoverDataset> {
        match name {
            Some(name) => self
                .land_cover
                .iter()
                .find(|d| d.identifier == name || d.title == name)
                .ok_or_else(|| anyhow!("Unknown land cover dataset: {}", name)),
            None => self
                .land_cover
                .first()
                .ok_or_else(|| anyhow!("No land cover datasets configured")),
        }
    }

    pub fn algorithm(&self, name: &str) -> Result<&AlgorithmConfig> {
        self.algorithms
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| anyhow!("Unknown algorithm: {}", name))
    }
}
