//! Bounded byte ring shared by one producer and many consumers.
//!
//! Every successful dequeue hands out a ticket (sequence number) while the
//! ring's lock is held, so tickets follow the ring's FIFO order exactly.

mod error;
mod ring;

pub use error::RingError;
pub use ring::{Dequeued, RingBuffer};
