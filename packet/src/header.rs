//! Fixed-size packet layout.
//!
//! Every packet is [`PACKET_SIZE`] bytes:
//! - `source`: 4 bytes (little-endian IPv4 as u32)
//! - `dest`: 4 bytes (little-endian IPv4 as u32)
//! - `timestamp`: 8 bytes (little-endian)
//! - payload: the remaining [`MAX_PAYLOAD`] bytes

use crate::error::PacketError;
use std::net::Ipv4Addr;

pub const PACKET_SIZE: usize = 256;
pub const HEADER_SIZE: usize = 16;
pub const MAX_PAYLOAD: usize = PACKET_SIZE - HEADER_SIZE;

const SOURCE_OFFSET: usize = 0;
const DEST_OFFSET: usize = 4;
const TIMESTAMP_OFFSET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub source: Ipv4Addr,
    pub dest: Ipv4Addr,
    pub timestamp: u64,
}

impl PacketHeader {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        if packet.len() < HEADER_SIZE {
            return Err(PacketError::Truncated {
                len: packet.len(),
                needed: HEADER_SIZE,
            });
        }

        Ok(Self {
            source: Ipv4Addr::from(read_u32(packet, SOURCE_OFFSET)),
            dest: Ipv4Addr::from(read_u32(packet, DEST_OFFSET)),
            timestamp: u64::from_le_bytes([
                packet[TIMESTAMP_OFFSET],
                packet[TIMESTAMP_OFFSET + 1],
                packet[TIMESTAMP_OFFSET + 2],
                packet[TIMESTAMP_OFFSET + 3],
                packet[TIMESTAMP_OFFSET + 4],
                packet[TIMESTAMP_OFFSET + 5],
                packet[TIMESTAMP_OFFSET + 6],
                packet[TIMESTAMP_OFFSET + 7],
            ]),
        })
    }
}

fn read_u32(packet: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        packet[offset],
        packet[offset + 1],
        packet[offset + 2],
        packet[offset + 3],
    ])
}

/// Builds packets in the on-wire layout.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    header: PacketHeader,
    payload: Vec<u8>,
}

impl PacketBuilder {
    pub fn new(source: Ipv4Addr, dest: Ipv4Addr, timestamp: u64) -> Self {
        Self {
            header: PacketHeader {
                source,
                dest,
                timestamp,
            },
            payload: Vec::new(),
        }
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(&self) -> Result<[u8; PACKET_SIZE], PacketError> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(PacketError::PayloadTooLarge {
                len: self.payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let mut packet = [0u8; PACKET_SIZE];
        packet[SOURCE_OFFSET..DEST_OFFSET]
            .copy_from_slice(&u32::from(self.header.source).to_le_bytes());
        packet[DEST_OFFSET..TIMESTAMP_OFFSET]
            .copy_from_slice(&u32::from(self.header.dest).to_le_bytes());
        packet[TIMESTAMP_OFFSET..HEADER_SIZE].copy_from_slice(&self.header.timestamp.to_le_bytes());
        packet[HEADER_SIZE..HEADER_SIZE + self.payload.len()].copy_from_slice(&self.payload);
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_parse_header() {
        let packet = PacketBuilder::new(
            Ipv4Addr::new(10, 1, 2, 3),
            Ipv4Addr::new(8, 8, 8, 8),
            1_700_000_000,
        )
        .payload(b"hello")
        .build()
        .unwrap();

        let header = PacketHeader::parse(&packet).unwrap();
        assert_eq!(header.source, Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(header.dest, Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!(header.timestamp, 1_700_000_000);
        assert_eq!(&packet[HEADER_SIZE..HEADER_SIZE + 5], b"hello");
    }

    #[test]
    fn test_timestamp_is_little_endian_at_offset_8() {
        let mut packet = [0u8; PACKET_SIZE];
        packet[8] = 0x2c;
        packet[9] = 0x01;
        assert_eq!(PacketHeader::parse(&packet).unwrap().timestamp, 300);
    }

    #[test]
    fn test_truncated_packet() {
        assert_eq!(
            PacketHeader::parse(&[0u8; 10]),
            Err(PacketError::Truncated {
                len: 10,
                needed: HEADER_SIZE
            })
        );
    }

    #[test]
    fn test_payload_too_large() {
        let builder = PacketBuilder::new(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST, 0)
            .payload(&[0u8; MAX_PAYLOAD + 1]);
        assert!(matches!(
            builder.build(),
            Err(PacketError::PayloadTooLarge { .. })
        ));
    }
}
