use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read config {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to open input {path:?}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    ReadInput(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] sieve_pipeline::ConfigError),

    #[error("policy error: {0}")]
    Policy(#[from] sieve_packet::PacketError),

    #[error("ring buffer error: {0}")]
    Ring(#[from] sieve_ring::RingError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] sieve_pipeline::PipelineError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
