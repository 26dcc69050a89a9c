#![doc = include_str!("../README.md")]
// Declare modules
pub mod error;
pub mod query;
pub mod range_index;
pub mod store;
pub mod telemetry;
pub mod trie;
pub mod types;

/// Error type for store and index operations.
pub use crate::error::StoreError;
/// Descending-by-value view over live entries, sorted when created.
pub use crate::query::RankedView;
/// Power-of-two interval table answering range max/min in constant time.
pub use crate::range_index::RangeIndexTable;
/// Keyed mutable front-end that keeps the interval table consistent.
pub use crate::store::{SegmentStore, StoreConfig};
/// Structured event hook for observability.
pub use crate::telemetry::{StoreEvent, StoreEventListener};
/// Idempotent combine operation (max or min).
pub use crate::types::Aggregate;
/// Type alias for a single measurement (i32 vehicle count).
pub use crate::types::Value;
/// Type alias for sums over many measurements (i64).
pub use crate::types::Total;
