use crate::config::SieveConfig;
use crate::driver::{FeedReport, feed};
use crate::error::CliError;
use clap::Args;
use sieve_packet::{PACKET_SIZE, PacketProcessor};
use sieve_pipeline::{CommitStrategy, ConsumerPool, PoolReport};
use sieve_ring::RingBuffer;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// File of fixed-size packets
    pub input: PathBuf,

    /// Verdict file, truncated on every run
    pub output: PathBuf,

    /// Number of consumer threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Ring capacity in packets
    #[arg(long)]
    pub ring_records: Option<usize>,

    /// How verdicts are forced into input order (ticket-wait, reorder-buffer)
    #[arg(long)]
    pub strategy: Option<CommitStrategy>,

    /// SHA-256 rounds per packet digest
    #[arg(long)]
    pub rounds: Option<u32>,

    /// JSON config file; flags take precedence over its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    fn resolve(&self) -> Result<SieveConfig, CliError> {
        let mut config = SieveConfig::load_or_default(self.config.as_deref())?;
        if let Some(workers) = self.workers {
            config.pipeline.workers = workers;
        }
        if let Some(ring_records) = self.ring_records {
            config.pipeline.ring_records = ring_records;
        }
        if let Some(strategy) = self.strategy {
            config.pipeline.strategy = strategy;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub feed: FeedReport,
    pub pool: PoolReport,
}

/// Feed the input through the pipeline and wait for every verdict to land.
pub fn run_pipeline(args: &RunArgs) -> Result<RunSummary, CliError> {
    let config = args.resolve()?;

    let input = File::open(&args.input).map_err(|source| CliError::OpenInput {
        path: args.input.clone(),
        source,
    })?;

    let capacity = config.pipeline.ring_capacity(PACKET_SIZE)?;
    let ring = Arc::new(RingBuffer::new(capacity)?);

    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        ring_records = config.pipeline.ring_records,
        ring_bytes = capacity,
        rounds = config.rounds,
        "Running sieve"
    );

    let processor = Arc::new(PacketProcessor::new(config.policy.clone(), config.rounds));
    let pool = ConsumerPool::start(&config.pipeline, ring.clone(), &args.output, processor)?;

    let fed = feed(&ring, BufReader::new(input), PACKET_SIZE);
    ring.stop();

    let pool = pool.join()?;
    let feed = fed?;

    tracing::info!(
        enqueued = feed.enqueued,
        rejected = feed.rejected,
        committed = pool.committed,
        "Run complete"
    );

    Ok(RunSummary { feed, pool })
}
