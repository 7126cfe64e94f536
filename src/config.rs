//! Pipeline configuration
//!
//! Every field has a default, so a configuration file only needs the values
//! it changes. YAML and JSON are both accepted.

use crate::error::{RegnetError, RegnetResult};
use regnet_dynamics::{SeedPolicy, SimulationParams};
use regnet_inference::InferenceConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Replicate batch settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Number of uninhibited replicate runs
    pub replicates: usize,
    /// Rows shown when reporting the most variable genes
    pub top: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            replicates: 10,
            top: 20,
        }
    }
}

/// Perturbation atlas settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Skip the atlas entirely
    pub disabled: bool,
    /// Genes to inhibit; every gene when absent
    pub targets: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base seed for simulation runs (run i uses seed + i)
    pub seed: u64,
    pub inference: InferenceConfig,
    pub simulation: SimulationParams,
    pub stability: StabilityConfig,
    pub atlas: AtlasConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            inference: InferenceConfig::default(),
            simulation: SimulationParams::default(),
            stability: StabilityConfig::default(),
            atlas: AtlasConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> RegnetResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> RegnetResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> RegnetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        tracing::debug!(path = %path.display(), "Loading pipeline configuration");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Seeds of the stability replicates: replicate i uses `seed + i`.
    pub fn seeds(&self) -> SeedPolicy {
        SeedPolicy::new(self.seed)
    }

    /// Seeds of the atlas runs, starting after the last stability replicate so
    /// no knockdown shares an initial state with a baseline run.
    pub fn atlas_seeds(&self) -> SeedPolicy {
        SeedPolicy::new(self.seed.wrapping_add(self.stability.replicates as u64))
    }

    pub fn validate(&self) -> RegnetResult<()> {
        self.inference.validate()?;
        self.simulation.validate()?;
        if self.stability.replicates == 0 {
            return Err(RegnetError::InvalidInput(
                "stability.replicates must be positive".to_string(),
            ));
        }
        if let Some(targets) = &self.atlas.targets {
            if targets.is_empty() {
                return Err(RegnetError::InvalidInput("atlas.targets is empty".to_string()));
            }
        }
        Ok(())
    }
}
