//! Ordered consumer pool.
//!
//! Workers race to dequeue, process their record with no lock held, then
//! commit the formatted line once their ticket is due.

use crate::config::{CommitStrategy, PipelineConfig};
use crate::error::PipelineError;
use crate::processor::{RecordProcessor, format_line};
use crate::reorder::{Finished, ReorderWindow, spawn_writer};
use crate::sink::{OutputContext, create_sink};
use sieve_ring::{RingBuffer, RingError};
use std::any::Any;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};

type WorkerHandle = JoinHandle<Result<u64, PipelineError>>;

/// Totals reported once every worker has been joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    pub committed: u64,
    /// Lines committed by each worker, indexed by worker number.
    pub per_worker: Vec<u64>,
}

#[derive(Clone)]
enum Committer {
    TicketWait(Arc<OutputContext>),
    Reorder {
        tx: SyncSender<Finished>,
        window: Arc<ReorderWindow>,
    },
}

impl Committer {
    /// Wait until `sequence` may be processed. Only the reorder buffer limits
    /// this; ticket-wait is already bounded by workers blocking in `commit`.
    fn admit(&self, sequence: u64) -> Result<(), PipelineError> {
        match self {
            Committer::TicketWait(_) => Ok(()),
            Committer::Reorder { window, .. } => window.admit(sequence),
        }
    }

    fn commit(&self, sequence: u64, line: String) -> Result<(), PipelineError> {
        match self {
            Committer::TicketWait(ctx) => ctx.commit(sequence, line.as_bytes()),
            Committer::Reorder { tx, .. } => tx
                .send((sequence, line))
                .map_err(|_| PipelineError::Aborted),
        }
    }

    fn abandon(&self, ring: &RingBuffer) {
        match self {
            Committer::TicketWait(ctx) => ctx.fail(),
            Committer::Reorder { window, .. } => {
                window.close();
                ring.abort();
            }
        }
    }
}

/// Armed while a worker holds a ticket it has not committed yet. Dropping it
/// armed (error or panic) tears the pipeline down so no one waits for the
/// lost ticket forever.
struct TicketGuard<'a> {
    committer: &'a Committer,
    ring: &'a RingBuffer,
    sequence: u64,
    armed: bool,
}

impl TicketGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::error!(sequence = self.sequence, "Ticket abandoned, aborting pipeline");
            self.committer.abandon(self.ring);
        }
    }
}

pub struct ConsumerPool {
    workers: Vec<WorkerHandle>,
    writer: Option<WorkerHandle>,
    context: Option<Arc<OutputContext>>,
}

impl ConsumerPool {
    /// Create or truncate `output_path` and start `config.workers` consumers
    /// draining `ring` into it.
    pub fn start(
        config: &PipelineConfig,
        ring: Arc<RingBuffer>,
        output_path: &Path,
        processor: Arc<dyn RecordProcessor>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let file = create_sink(output_path)?;
        Self::start_with_sink(config, ring, Box::new(file), processor)
    }

    /// Like [`ConsumerPool::start`] with an arbitrary sink.
    pub fn start_with_sink(
        config: &PipelineConfig,
        ring: Arc<RingBuffer>,
        sink: Box<dyn Write + Send>,
        processor: Arc<dyn RecordProcessor>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let record_size = processor.record_size();
        if record_size == 0 || record_size > ring.capacity() {
            return Err(RingError::InvalidRecordSize {
                size: record_size,
                capacity: ring.capacity(),
            }
            .into());
        }

        let (committer, context, writer) = match config.strategy {
            CommitStrategy::TicketWait => {
                let ctx = Arc::new(OutputContext::new(ring.clone(), sink));
                (Committer::TicketWait(ctx.clone()), Some(ctx), None)
            }
            CommitStrategy::ReorderBuffer => {
                let depth = config.reorder_window();
                let window = Arc::new(ReorderWindow::new(depth));
                let (tx, rx) = mpsc::sync_channel(depth);
                let writer = spawn_writer(ring.clone(), window.clone(), sink, rx)?;
                (Committer::Reorder { tx, window }, None, Some(writer))
            }
        };

        tracing::info!(
            workers = config.workers,
            strategy = %config.strategy,
            capacity = ring.capacity(),
            record_size,
            "Starting consumer pool"
        );

        let mut workers = Vec::with_capacity(config.workers);
        for i in 0..config.workers {
            let worker_ring = ring.clone();
            let worker_processor = processor.clone();
            let worker_committer = committer.clone();
            let spawned = thread::Builder::new()
                .name(format!("sieve-worker-{}", i))
                .spawn(move || {
                    worker_loop(
                        i,
                        &worker_ring,
                        worker_processor.as_ref(),
                        &worker_committer,
                    )
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    tracing::error!(worker = i, error = %e, "Failed to spawn worker");
                    committer.abandon(&ring);
                    drop(committer);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    if let Some(writer) = writer {
                        let _ = writer.join();
                    }
                    return Err(PipelineError::Spawn(e));
                }
            }
        }

        Ok(Self {
            workers,
            writer,
            context,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to observe the end of data, then flush the sink.
    ///
    /// The caller must have stopped the ring, otherwise this blocks forever.
    pub fn join(self) -> Result<PoolReport, PipelineError> {
        let mut per_worker = Vec::with_capacity(self.workers.len());
        let mut first_error: Option<PipelineError> = None;

        for (worker, handle) in self.workers.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(committed)) => per_worker.push(committed),
                Ok(Err(e)) => {
                    per_worker.push(0);
                    keep_root_cause(&mut first_error, e);
                }
                Err(panic) => {
                    per_worker.push(0);
                    keep_root_cause(
                        &mut first_error,
                        PipelineError::WorkerPanicked {
                            worker,
                            message: panic_message(panic.as_ref()),
                        },
                    );
                }
            }
        }

        let committed = match (self.writer, self.context) {
            (Some(writer), _) => match writer.join() {
                Ok(Ok(lines)) => lines,
                Ok(Err(e)) => {
                    keep_root_cause(&mut first_error, e);
                    0
                }
                Err(panic) => {
                    keep_root_cause(
                        &mut first_error,
                        PipelineError::WriterPanicked(panic_message(panic.as_ref())),
                    );
                    0
                }
            },
            (None, Some(ctx)) => {
                if first_error.is_none() {
                    ctx.flush()?;
                }
                ctx.next_to_write()
            }
            (None, None) => 0,
        };

        if let Some(e) = first_error {
            tracing::error!(error = %e, "Consumer pool failed");
            return Err(e);
        }

        tracing::info!(committed, "Consumer pool finished");
        Ok(PoolReport {
            committed,
            per_worker,
        })
    }
}

fn worker_loop(
    worker: usize,
    ring: &RingBuffer,
    processor: &dyn RecordProcessor,
    committer: &Committer,
) -> Result<u64, PipelineError> {
    let mut record = vec![0u8; processor.record_size()];
    let mut committed = 0u64;

    while let Some(sequence) = ring.dequeue_into(&mut record)? {
        let guard = TicketGuard {
            committer,
            ring,
            sequence,
            armed: true,
        };

        committer.admit(sequence)?;
        let outcome = processor.process(&record);
        let line = format_line(&outcome);
        tracing::trace!(worker, sequence, label = outcome.label, "Record processed");

        committer.commit(sequence, line)?;
        guard.disarm();
        committed += 1;
    }

    tracing::debug!(worker, committed, "Worker finished");
    Ok(committed)
}

/// Later failures are usually fallout from the first one; keep the cause.
fn keep_root_cause(slot: &mut Option<PipelineError>, e: PipelineError) {
    match slot {
        None => *slot = Some(e),
        Some(PipelineError::Aborted) if !matches!(e, PipelineError::Aborted) => *slot = Some(e),
        Some(_) => {}
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
