use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("ring buffer capacity must be non-zero")]
    InvalidCapacity,

    #[error("failed to allocate {capacity} bytes of ring storage")]
    Allocation { capacity: usize },

    #[error("invalid record size {size} for ring of capacity {capacity}")]
    InvalidRecordSize { size: usize, capacity: usize },

    #[error("ring buffer is full and stopped, record of {size} bytes rejected")]
    Rejected { size: usize },

    #[error("ring buffer was aborted")]
    Aborted,
}
