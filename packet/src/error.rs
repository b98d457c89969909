use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet truncated: {len} bytes, header needs {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("invalid source range: {start} is after {end}")]
    InvalidRange { start: String, end: String },
}
