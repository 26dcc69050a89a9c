use std::sync::Arc;
use std::time::Duration;

use crate::types::Value;

/// Structured, in-process event hook for observability.
///
/// The store is a library and never prints. Callers that want logs provide an
/// implementation that forwards these events to stderr, `tracing`, `log`, or any other
/// sink.
pub trait StoreEventListener: std::fmt::Debug + Send + Sync + 'static {
    fn on_event(&self, event: StoreEvent);
}

/// Structured events emitted by [`crate::SegmentStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    EntryAdded {
        id: String,
        slot: usize,
        value: Value,
    },
    /// `relocated` names the entry moved from the last live slot into `slot`, if any.
    EntryRemoved {
        id: String,
        slot: usize,
        relocated: Option<String>,
    },
    ValueUpdated {
        id: String,
        slot: usize,
        old: Value,
        new: Value,
    },
    IndexRebuilt {
        len: usize,
        levels: usize,
        parallel: bool,
        elapsed: Duration,
    },
    MutationRejected {
        op: &'static str,
        reason: String,
    },
}

#[derive(Debug)]
pub struct NoopEventListener;

impl StoreEventListener for NoopEventListener {
    #[inline]
    fn on_event(&self, _event: StoreEvent) {}
}

pub fn noop_event_listener() -> Arc<dyn StoreEventListener> {
    Arc::new(NoopEventListener)
}

/// Metrics instrumentation through the `metrics` facade.
///
/// Recording is effectively a no-op until the embedding application installs a
/// recorder.
pub mod store_metrics {
    use super::*;

    use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

    pub const MUTATIONS: &str = "segment_index_mutations";
    pub const MUTATIONS_REJECTED: &str = "segment_index_mutations_rejected";
    pub const REBUILD_DURATION_SECONDS: &str = "segment_index_rebuild_duration_seconds";
    pub const LIVE_ENTRIES: &str = "segment_index_live_entries";

    #[inline]
    pub fn record_mutation(op: &'static str) {
        ::metrics::counter!(MUTATIONS, "op" => op).increment(1);
    }

    #[inline]
    pub fn record_rejected(op: &'static str) {
        ::metrics::counter!(MUTATIONS_REJECTED, "op" => op).increment(1);
    }

    #[inline]
    pub fn record_rebuild(duration: Duration, live_entries: usize) {
        ::metrics::histogram!(REBUILD_DURATION_SECONDS).record(duration.as_secs_f64());
        ::metrics::gauge!(LIVE_ENTRIES).set(live_entries as f64);
    }

    /// Registers descriptions with the installed recorder. Call once after installing it.
    pub fn describe_all() {
        describe_counter!(
            MUTATIONS,
            Unit::Count,
            "Successful add/update/remove calls, labelled by operation."
        );
        describe_counter!(
            MUTATIONS_REJECTED,
            Unit::Count,
            "Mutations rejected by validation, labelled by operation."
        );
        describe_histogram!(
            REBUILD_DURATION_SECONDS,
            Unit::Seconds,
            "Time to rebuild the max/min interval tables after a mutation."
        );
        describe_gauge!(
            LIVE_ENTRIES,
            Unit::Count,
            "Number of live segments after the most recent rebuild."
        );
    }
}
