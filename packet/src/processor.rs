use crate::header::{PACKET_SIZE, PacketHeader};
use crate::policy::{Action, FilterPolicy};
use sha2::{Digest, Sha256};
use sieve_pipeline::{Outcome, RecordProcessor};

pub const DEFAULT_ROUNDS: u32 = 1;

/// 64-bit digest of a packet: the leading 8 bytes (big-endian) of SHA-256,
/// re-hashed `rounds` times in total.
pub fn packet_digest(packet: &[u8], rounds: u32) -> u64 {
    let mut hash = Sha256::digest(packet);
    for _ in 1..rounds {
        hash = Sha256::digest(hash);
    }
    let mut leading = [0u8; 8];
    leading.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(leading)
}

/// Classifies packets against a [`FilterPolicy`] and digests them.
#[derive(Debug, Clone)]
pub struct PacketProcessor {
    policy: FilterPolicy,
    rounds: u32,
}

impl PacketProcessor {
    pub fn new(policy: FilterPolicy, rounds: u32) -> Self {
        Self {
            policy,
            rounds: rounds.max(1),
        }
    }
}

impl Default for PacketProcessor {
    fn default() -> Self {
        Self::new(FilterPolicy::default(), DEFAULT_ROUNDS)
    }
}

impl RecordProcessor for PacketProcessor {
    fn record_size(&self) -> usize {
        PACKET_SIZE
    }

    fn process(&self, record: &[u8]) -> Outcome {
        let digest = packet_digest(record, self.rounds);
        match PacketHeader::parse(record) {
            Ok(header) => Outcome {
                label: self.policy.classify(header.source).as_str(),
                digest,
                timestamp: header.timestamp,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Malformed packet dropped");
                Outcome {
                    label: Action::Drop.as_str(),
                    digest,
                    timestamp: 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PacketBuilder;
    use std::net::Ipv4Addr;

    #[test]
    fn test_digest_of_empty_input() {
        // SHA-256("") = e3b0c44298fc1c14...
        assert_eq!(packet_digest(b"", 1), 0xe3b0_c442_98fc_1c14);
    }

    #[test]
    fn test_rounds_change_digest() {
        let packet = [7u8; PACKET_SIZE];
        assert_ne!(packet_digest(&packet, 1), packet_digest(&packet, 2));
        assert_eq!(packet_digest(&packet, 0), packet_digest(&packet, 1));
    }

    #[test]
    fn test_process_classifies_and_keeps_timestamp() {
        let processor = PacketProcessor::default();
        let allowed = PacketBuilder::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(1, 1, 1, 1), 100)
            .build()
            .unwrap();
        let blocked = PacketBuilder::new(Ipv4Addr::new(8, 8, 4, 4), Ipv4Addr::new(1, 1, 1, 1), 200)
            .build()
            .unwrap();

        let outcome = processor.process(&allowed);
        assert_eq!(outcome.label, "PASS");
        assert_eq!(outcome.timestamp, 100);
        assert_eq!(outcome.digest, packet_digest(&allowed, 1));

        let outcome = processor.process(&blocked);
        assert_eq!(outcome.label, "DROP");
        assert_eq!(outcome.timestamp, 200);
    }

    #[test]
    fn test_malformed_record_is_dropped() {
        let outcome = PacketProcessor::default().process(&[1u8; 4]);
        assert_eq!(outcome.label, "DROP");
        assert_eq!(outcome.timestamp, 0);
    }
}
