use crate::error::CliError;
use serde::{Deserialize, Serialize};
use sieve_packet::{DEFAULT_ROUNDS, FilterPolicy};
use sieve_pipeline::PipelineConfig;
use std::path::Path;

/// Everything a run can be configured with from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    pub pipeline: PipelineConfig,
    pub policy: FilterPolicy,
    /// SHA-256 rounds per packet digest.
    pub rounds: u32,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            policy: FilterPolicy::default(),
            rounds: DEFAULT_ROUNDS,
        }
    }
}

impl SieveConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SieveConfig =
            serde_json::from_str(&content).map_err(|source| CliError::ParseConfig {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.pipeline.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}
