use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("ring must hold at least one record")]
    EmptyRing,

    #[error("ring capacity overflows: {records} records of {record_size} bytes")]
    CapacityOverflow { records: usize, record_size: usize },

    #[error("invalid commit strategy: {0}")]
    InvalidStrategy(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("ring buffer error: {0}")]
    Ring(#[from] sieve_ring::RingError),

    #[error("failed to open output {path:?}: {source}")]
    OpenSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to write line for ticket {sequence}: {source}")]
    Write {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to flush output: {0}")]
    Flush(#[source] std::io::Error),

    #[error("output gap: expected ticket {expected}, lowest pending is {found} ({pending} lines pending)")]
    SequenceGap {
        expected: u64,
        found: u64,
        pending: usize,
    },

    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    #[error("reorder writer panicked: {0}")]
    WriterPanicked(String),

    #[error("pipeline aborted after a failure elsewhere")]
    Aborted,
}
