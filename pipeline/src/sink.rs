//! Shared output context: commits lines to the sink strictly in ticket order.

use crate::error::PipelineError;
use sieve_ring::RingBuffer;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Create or truncate the output file at `path`.
pub(crate) fn create_sink(path: &Path) -> Result<File, PipelineError> {
    let file = File::create(path).map_err(|source| PipelineError::OpenSink {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Output sink opened");
    Ok(file)
}

struct SinkState {
    sink: Box<dyn Write + Send>,
    next_to_write: u64,
    failed: bool,
}

/// Monitor around the output sink and the next ticket allowed to write.
///
/// Created once per run, shared by every worker, and dropped (closing the
/// sink) only after all workers are joined.
pub struct OutputContext {
    ring: Arc<RingBuffer>,
    state: Mutex<SinkState>,
    advanced: Condvar,
}

impl OutputContext {
    pub fn new(ring: Arc<RingBuffer>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            ring,
            state: Mutex::new(SinkState {
                sink,
                next_to_write: 0,
                failed: false,
            }),
            advanced: Condvar::new(),
        }
    }

    /// Wait until `sequence` is due, write `line`, and hand the turn to the
    /// next ticket.
    pub fn commit(&self, sequence: u64, line: &[u8]) -> Result<(), PipelineError> {
        let mut state = self.lock();
        while sequence != state.next_to_write && !state.failed {
            state = self
                .advanced
                .wait(state)
                .expect("output context mutex poisoned");
        }

        if state.failed {
            return Err(PipelineError::Aborted);
        }

        if let Err(source) = state.sink.write_all(line) {
            tracing::error!(sequence, error = %source, "Output write failed");
            state.failed = true;
            self.advanced.notify_all();
            drop(state);
            self.ring.abort();
            return Err(PipelineError::Write { sequence, source });
        }

        state.next_to_write += 1;
        self.advanced.notify_all();
        Ok(())
    }

    /// Number of lines committed so far.
    pub fn next_to_write(&self) -> u64 {
        self.lock().next_to_write
    }

    /// Give up on ordered output: wake every waiter with `Aborted` and abort
    /// the ring so the producer and the remaining workers unwind.
    pub fn fail(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.failed = true;
            self.advanced.notify_all();
        }
        self.ring.abort();
    }

    pub fn flush(&self) -> Result<(), PipelineError> {
        self.lock().sink.flush().map_err(PipelineError::Flush)
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().expect("output context mutex poisoned")
    }
}
