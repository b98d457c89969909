//! Producer side: feeds fixed-size records from a reader into the ring.

use crate::error::CliError;
use sieve_ring::{RingBuffer, RingError};
use std::io::{self, Read};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedReport {
    pub enqueued: u64,
    /// Records refused because the ring was full and already stopped.
    pub rejected: u64,
    /// Bytes left over after the last whole record.
    pub trailing_bytes: usize,
}

/// Enqueue every whole record read from `reader`.
///
/// Does not stop the ring; the caller does that once feeding is over.
pub fn feed<R: Read>(
    ring: &RingBuffer,
    mut reader: R,
    record_size: usize,
) -> Result<FeedReport, CliError> {
    let mut report = FeedReport::default();
    let mut record = vec![0u8; record_size];

    loop {
        let filled = read_record(&mut reader, &mut record).map_err(CliError::ReadInput)?;
        if filled == 0 {
            break;
        }
        if filled < record_size {
            tracing::warn!(
                trailing = filled,
                record_size,
                "Ignoring trailing partial record"
            );
            report.trailing_bytes = filled;
            break;
        }

        match ring.enqueue(&record) {
            Ok(_) => report.enqueued += 1,
            Err(RingError::Rejected { size }) => {
                report.rejected += 1;
                tracing::warn!(
                    record = report.enqueued + report.rejected,
                    size,
                    "Record rejected, ring full and stopped"
                );
            }
            Err(RingError::Aborted) => {
                tracing::warn!(
                    enqueued = report.enqueued,
                    "Pipeline aborted, no longer reading input"
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}

/// Fill `buf` as far as the reader allows. Returns the number of bytes read,
/// which is short only at end of input.
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most `chunk` bytes per call.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_feeds_whole_records() {
        let ring = RingBuffer::new(64).unwrap();
        let input: Vec<u8> = (0..32u8).collect();

        let report = feed(&ring, Cursor::new(input), 8).unwrap();
        assert_eq!(report.enqueued, 4);
        assert_eq!(report.trailing_bytes, 0);

        let first = ring.dequeue(8).unwrap().unwrap();
        assert_eq!(first.bytes, (0..8u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_short_reads_are_reassembled() {
        let ring = RingBuffer::new(64).unwrap();
        let reader = Trickle {
            data: Cursor::new((0..24u8).collect()),
            chunk: 3,
        };

        let report = feed(&ring, reader, 8).unwrap();
        assert_eq!(report.enqueued, 3);
        ring.dequeue(8).unwrap();
        let second = ring.dequeue(8).unwrap().unwrap();
        assert_eq!(second.bytes, (8..16u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_trailing_partial_record_is_dropped() {
        let ring = RingBuffer::new(64).unwrap();
        let report = feed(&ring, Cursor::new(vec![1u8; 20]), 8).unwrap();
        assert_eq!(report.enqueued, 2);
        assert_eq!(report.trailing_bytes, 4);
        assert_eq!(ring.len(), 16);
    }

    #[test]
    fn test_rejections_are_counted() {
        let ring = RingBuffer::new(16).unwrap();
        ring.stop();
        let report = feed(&ring, Cursor::new(vec![0u8; 32]), 8).unwrap();
        assert_eq!(report.enqueued, 2);
        assert_eq!(report.rejected, 2);
    }

    #[test]
    fn test_aborted_ring_stops_feeding() {
        let ring = RingBuffer::new(16).unwrap();
        ring.abort();
        let report = feed(&ring, Cursor::new(vec![0u8; 32]), 8).unwrap();
        assert_eq!(report, FeedReport::default());
    }
}
