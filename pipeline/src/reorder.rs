//! Reorder-buffer commit: a single writer thread drains finished lines in
//! ticket order, so workers never wait on each other's output.
//!
//! Workers may only run `window` tickets ahead of the writer. Together with a
//! channel of the same depth this keeps the reorder buffer, and therefore the
//! whole pipeline, bounded while one slow record holds up the rest.

use crate::error::PipelineError;
use sieve_ring::RingBuffer;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// A processed line tagged with its ticket.
pub(crate) type Finished = (u64, String);

struct WindowState {
    written: u64,
    closed: bool,
}

/// Admission control for tickets ahead of the writer.
pub(crate) struct ReorderWindow {
    size: u64,
    state: Mutex<WindowState>,
    advanced: Condvar,
}

impl ReorderWindow {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size: size.max(1) as u64,
            state: Mutex::new(WindowState {
                written: 0,
                closed: false,
            }),
            advanced: Condvar::new(),
        }
    }

    /// Block until `sequence` is less than `size` tickets ahead of the writer.
    pub(crate) fn admit(&self, sequence: u64) -> Result<(), PipelineError> {
        let mut state = self.lock();
        while sequence >= state.written.saturating_add(self.size) && !state.closed {
            state = self
                .advanced
                .wait(state)
                .expect("reorder window mutex poisoned");
        }

        if state.closed {
            return Err(PipelineError::Aborted);
        }
        Ok(())
    }

    fn advance(&self, written: u64) {
        let mut state = self.lock();
        state.written = written;
        self.advanced.notify_all();
    }

    /// Release every waiter with `Aborted`; no further tickets are admitted.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        self.advanced.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().expect("reorder window mutex poisoned")
    }
}

pub(crate) fn spawn_writer(
    ring: Arc<RingBuffer>,
    window: Arc<ReorderWindow>,
    sink: Box<dyn Write + Send>,
    rx: Receiver<Finished>,
) -> Result<JoinHandle<Result<u64, PipelineError>>, PipelineError> {
    thread::Builder::new()
        .name("sieve-writer".to_string())
        .spawn(move || {
            let result = drain_in_order(sink, rx, &window);
            if let Err(e) = &result {
                tracing::error!(error = %e, "Reorder writer failed");
                window.close();
                ring.abort();
            }
            result
        })
        .map_err(PipelineError::Spawn)
}

/// Write every line in ticket order until all senders hang up.
///
/// Returns the number of lines written.
pub(crate) fn drain_in_order(
    mut sink: Box<dyn Write + Send>,
    rx: Receiver<Finished>,
    window: &ReorderWindow,
) -> Result<u64, PipelineError> {
    let mut pending: BTreeMap<u64, String> = BTreeMap::new();
    let mut next_to_write = 0u64;

    for (sequence, line) in rx {
        pending.insert(sequence, line);
        let before = next_to_write;
        while let Some(line) = pending.remove(&next_to_write) {
            sink.write_all(line.as_bytes())
                .map_err(|source| PipelineError::Write {
                    sequence: next_to_write,
                    source,
                })?;
            next_to_write += 1;
        }
        if next_to_write != before {
            window.advance(next_to_write);
        }
    }

    sink.flush().map_err(PipelineError::Flush)?;

    if let Some((&found, _)) = pending.first_key_value() {
        return Err(PipelineError::SequenceGap {
            expected: next_to_write,
            found,
            pending: pending.len(),
        });
    }

    tracing::debug!(lines = next_to_write, "Reorder writer drained");
    Ok(next_to_write)
}
