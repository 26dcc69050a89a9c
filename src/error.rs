use crate::types::Value;
use thiserror::Error;

/// Error type for segment store and range index operations.
///
/// Every variant is recoverable: the store validates before it mutates, so a
/// failed call leaves the value array, the identifier mapping and the interval
/// table exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Segment already exists: {0}")]
    DuplicateKey(String),

    #[error("Segment not found: {0}")]
    UnknownKey(String),

    #[error("Capacity exceeded: store holds at most {capacity} segments")]
    CapacityExceeded { capacity: usize },

    /// Measurements are vehicle counts and cannot be negative.
    #[error("Invalid value: {value} (counts must be non-negative)")]
    InvalidValue { value: Value },

    /// Range bounds outside `[1, count]` (store) or `[0, len)` (index), or inverted.
    #[error("Invalid range: start={start}, end={end}, count={count}")]
    InvalidRange {
        start: usize,
        end: usize,
        count: usize,
    },

    #[error("Invalid segment name: {0:?}")]
    InvalidName(String),

    #[error("Configuration Error: {0}")]
    ConfigError(String),
}
