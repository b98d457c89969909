use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_RING_RECORDS: usize = 1000;

/// How finished lines are forced into ticket order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitStrategy {
    /// Each worker waits on the shared output context until its ticket is due.
    #[default]
    TicketWait,
    /// Workers hand lines to a dedicated writer thread that reorders them.
    ReorderBuffer,
}

impl std::fmt::Display for CommitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitStrategy::TicketWait => write!(f, "ticket-wait"),
            CommitStrategy::ReorderBuffer => write!(f, "reorder-buffer"),
        }
    }
}

impl FromStr for CommitStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ticket-wait" => Ok(CommitStrategy::TicketWait),
            "reorder-buffer" => Ok(CommitStrategy::ReorderBuffer),
            other => Err(ConfigError::InvalidStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workers: usize,
    /// Ring capacity expressed in whole records.
    pub ring_records: usize,
    pub strategy: CommitStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            ring_records: DEFAULT_RING_RECORDS,
            strategy: CommitStrategy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.ring_records == 0 {
            return Err(ConfigError::EmptyRing);
        }
        Ok(())
    }

    /// Ring capacity in bytes, always a whole number of records.
    pub fn ring_capacity(&self, record_size: usize) -> Result<usize, ConfigError> {
        self.validate()?;
        self.ring_records
            .checked_mul(record_size)
            .ok_or(ConfigError::CapacityOverflow {
                records: self.ring_records,
                record_size,
            })
    }

    /// How many tickets the reorder buffer lets workers run ahead of the
    /// writer. Also the depth of the channel feeding it.
    pub fn reorder_window(&self) -> usize {
        self.workers.saturating_add(self.ring_records)
    }
}
