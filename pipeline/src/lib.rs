//! Ordered consumer pool draining a [`sieve_ring::RingBuffer`].
//!
//! Records are processed in parallel but their output lines are committed to a
//! single sink in exactly the order the ring handed them out.

mod config;
mod error;
mod pool;
mod processor;
mod reorder;
mod sink;

#[cfg(test)]
mod test_utils;

pub use config::{CommitStrategy, DEFAULT_RING_RECORDS, DEFAULT_WORKERS, PipelineConfig};
pub use error::{ConfigError, PipelineError};
pub use pool::{ConsumerPool, PoolReport};
pub use processor::{Outcome, RecordProcessor, format_line};
pub use sink::OutputContext;
