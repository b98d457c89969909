//! The per-record processing hook and the output line format.

/// Result of processing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Canonical short name of the classification.
    pub label: &'static str,
    pub digest: u64,
    pub timestamp: u64,
}

/// Work performed on each record outside of any lock.
///
/// Implementations are called concurrently from every worker and must not
/// touch shared mutable state.
pub trait RecordProcessor: Send + Sync {
    /// Fixed size of every record in the ring, in bytes.
    fn record_size(&self) -> usize;

    fn process(&self, record: &[u8]) -> Outcome;
}

/// Render the committed line: `"<label> <digest:016x> <timestamp>\n"`.
pub fn format_line(outcome: &Outcome) -> String {
    format!(
        "{} {:016x} {}\n",
        outcome.label, outcome.digest, outcome.timestamp
    )
}
