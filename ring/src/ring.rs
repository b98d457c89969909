//! Mutex/condvar protected circular byte buffer.
//!
//! The ring knows nothing about record boundaries: producer and consumers must
//! agree on a fixed record size and pass it on every call. Offsets, occupancy,
//! the stop flag and the ticket counter are only touched with the lock held.

use crate::error::RingError;
use std::sync::{Condvar, Mutex, MutexGuard};

/// A record taken out of the ring together with its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dequeued {
    pub sequence: u64,
    pub bytes: Vec<u8>,
}

struct RingState {
    storage: Box<[u8]>,
    read_offset: usize,
    write_offset: usize,
    occupied: usize,
    stopped: bool,
    aborted: bool,
    next_sequence: u64,
}

impl RingState {
    fn free(&self) -> usize {
        self.storage.len() - self.occupied
    }

    fn write(&mut self, record: &[u8]) {
        let cap = self.storage.len();
        let first = record.len().min(cap - self.write_offset);
        self.storage[self.write_offset..self.write_offset + first]
            .copy_from_slice(&record[..first]);
        self.storage[..record.len() - first].copy_from_slice(&record[first..]);

        self.write_offset = (self.write_offset + record.len()) % cap;
        self.occupied += record.len();
    }

    fn read(&mut self, out: &mut [u8]) {
        let cap = self.storage.len();
        let first = out.len().min(cap - self.read_offset);
        out[..first].copy_from_slice(&self.storage[self.read_offset..self.read_offset + first]);
        let rest = out.len() - first;
        out[first..].copy_from_slice(&self.storage[..rest]);

        self.read_offset = (self.read_offset + out.len()) % cap;
        self.occupied -= out.len();
    }
}

/// Bounded FIFO of fixed-size records with blocking enqueue/dequeue.
pub struct RingBuffer {
    state: Mutex<RingState>,
    space_available: Condvar,
    data_available: Condvar,
    capacity: usize,
}

impl RingBuffer {
    /// Allocate a ring holding exactly `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::InvalidCapacity);
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| RingError::Allocation { capacity })?;
        storage.resize(capacity, 0u8);

        tracing::debug!(capacity, "Ring buffer allocated");

        Ok(Self {
            state: Mutex::new(RingState {
                storage: storage.into_boxed_slice(),
                read_offset: 0,
                write_offset: 0,
                occupied: 0,
                stopped: false,
                aborted: false,
                next_sequence: 0,
            }),
            space_available: Condvar::new(),
            data_available: Condvar::new(),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently held.
    pub fn len(&self) -> usize {
        self.lock().occupied
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// The ticket the next successful dequeue will receive.
    pub fn issued(&self) -> u64 {
        self.lock().next_sequence
    }

    /// Copy `record` into the ring, blocking while there is no room for it.
    ///
    /// Returns the number of bytes written. Once the ring is stopped and still
    /// has no room, the record is refused with [`RingError::Rejected`].
    pub fn enqueue(&self, record: &[u8]) -> Result<usize, RingError> {
        let size = record.len();
        self.check_size(size)?;

        let mut state = self.lock();
        while state.free() < size && !state.stopped {
            state = self
                .space_available
                .wait(state)
                .expect("ring buffer mutex poisoned");
        }

        if state.aborted {
            return Err(RingError::Aborted);
        }
        if state.free() < size {
            return Err(RingError::Rejected { size });
        }

        state.write(record);
        self.data_available.notify_one();
        Ok(size)
    }

    /// Take `size` bytes out of the ring, blocking while it is empty.
    ///
    /// `Ok(None)` means the ring is stopped and drained; the caller should
    /// stop consuming.
    pub fn dequeue(&self, size: usize) -> Result<Option<Dequeued>, RingError> {
        let mut bytes = vec![0u8; size];
        Ok(self
            .dequeue_into(&mut bytes)?
            .map(|sequence| Dequeued { sequence, bytes }))
    }

    /// Like [`RingBuffer::dequeue`], filling `out` (whose length is the record
    /// size) and returning only the ticket.
    pub fn dequeue_into(&self, out: &mut [u8]) -> Result<Option<u64>, RingError> {
        let size = out.len();
        self.check_size(size)?;

        let mut state = self.lock();
        while state.occupied < size && !state.stopped {
            state = self
                .data_available
                .wait(state)
                .expect("ring buffer mutex poisoned");
        }

        if state.aborted {
            return Ok(None);
        }
        if state.occupied < size {
            if state.occupied > 0 {
                tracing::warn!(
                    stranded = state.occupied,
                    size,
                    "Ring stopped holding less than one record"
                );
            }
            return Ok(None);
        }

        state.read(out);
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        self.space_available.notify_one();
        Ok(Some(sequence))
    }

    /// Mark the ring stopped and wake every blocked consumer.
    ///
    /// Must only be called once the producer has finished enqueuing: blocked
    /// producers are not woken.
    pub fn stop(&self) {
        let mut state = self.lock();
        if !state.stopped {
            tracing::debug!(pending = state.occupied, "Ring buffer stopped");
        }
        state.stopped = true;
        self.data_available.notify_all();
    }

    /// Stop the ring and discard whatever it still holds.
    ///
    /// Wakes waiters on both sides: consumers get the end-of-data sentinel and
    /// producers get [`RingError::Aborted`].
    pub fn abort(&self) {
        let mut state = self.lock();
        if !state.aborted {
            tracing::warn!(discarded = state.occupied, "Ring buffer aborted");
        }
        state.stopped = true;
        state.aborted = true;
        state.occupied = 0;
        state.read_offset = state.write_offset;
        self.data_available.notify_all();
        self.space_available.notify_all();
    }

    fn check_size(&self, size: usize) -> Result<(), RingError> {
        if size == 0 || size > self.capacity {
            return Err(RingError::InvalidRecordSize {
                size,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().expect("ring buffer mutex poisoned")
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("occupied", &state.occupied)
            .field("read_offset", &state.read_offset)
            .field("write_offset", &state.write_offset)
            .field("stopped", &state.stopped)
            .field("next_sequence", &state.next_sequence)
            .finish()
    }
}
