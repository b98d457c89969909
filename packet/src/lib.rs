//! Packet layout and classification for the sieve pipeline.
//!
//! [`PacketProcessor`] is the pipeline's processing hook: it parses the fixed
//! header, checks the source against a [`FilterPolicy`], and digests the whole
//! packet with SHA-256.

mod error;
mod header;
mod policy;
mod processor;

pub use error::PacketError;
pub use header::{HEADER_SIZE, MAX_PAYLOAD, PACKET_SIZE, PacketBuilder, PacketHeader};
pub use policy::{Action, FilterPolicy, SourceRange};
pub use processor::{DEFAULT_ROUNDS, PacketProcessor, packet_digest};
