//! Sinks and processors shared by the pipeline tests.

use crate::processor::{Outcome, RecordProcessor};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// In-memory sink whose contents can be read after the pipeline is done.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that accepts a fixed number of writes and then errors.
pub struct FailingSink {
    remaining: usize,
}

impl FailingSink {
    pub fn after_lines(lines: usize) -> Self {
        Self { remaining: lines }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::other("disk full"));
        }
        self.remaining -= 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub const TEST_RECORD_SIZE: usize = 16;

/// Test record: timestamp followed by how long processing should take.
pub fn test_record(timestamp: u64, delay_ms: u64) -> [u8; TEST_RECORD_SIZE] {
    let mut record = [0u8; TEST_RECORD_SIZE];
    record[..8].copy_from_slice(&timestamp.to_le_bytes());
    record[8..].copy_from_slice(&delay_ms.to_le_bytes());
    record
}

/// Sleeps for the record's delay, then labels even timestamps `PASS`.
pub struct DelayProcessor {
    pub panic_on: Option<u64>,
}

impl RecordProcessor for DelayProcessor {
    fn record_size(&self) -> usize {
        TEST_RECORD_SIZE
    }

    fn process(&self, record: &[u8]) -> Outcome {
        let timestamp = u64::from_le_bytes(record[..8].try_into().unwrap());
        let delay_ms = u64::from_le_bytes(record[8..16].try_into().unwrap());
        if self.panic_on == Some(timestamp) {
            panic!("processor exploded on {}", timestamp);
        }
        thread::sleep(Duration::from_millis(delay_ms));
        Outcome {
            label: if timestamp % 2 == 0 { "PASS" } else { "DROP" },
            digest: timestamp.wrapping_mul(0x9e37_79b9_7f4a_7c15),
            timestamp,
        }
    }
}

/// Holds the record with timestamp 0 until the gate opens; everything else
/// goes straight through [`DelayProcessor`].
pub struct GatedProcessor {
    pub gate: Arc<AtomicBool>,
    pub inner: DelayProcessor,
}

impl RecordProcessor for GatedProcessor {
    fn record_size(&self) -> usize {
        TEST_RECORD_SIZE
    }

    fn process(&self, record: &[u8]) -> Outcome {
        if record[..8] == 0u64.to_le_bytes() {
            while !self.gate.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
        }
        self.inner.process(record)
    }
}
