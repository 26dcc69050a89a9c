//! Keyed, mutable front-end over [`RangeIndexTable`].
//!
//! `SegmentStore` owns the value array, the identifier-to-slot mapping and the interval
//! table. It is the only mutation path: every add, update or remove validates first,
//! then changes the array, then rebuilds the table before returning, so a query never
//! sees a stale table.

use crate::error::StoreError;
use crate::query::{slice_average, slice_total, to_slot_range, RankedView};
use crate::range_index::{RangeIndexTable, DEFAULT_PARALLEL_REBUILD_THRESHOLD};
use crate::telemetry::{noop_event_listener, store_metrics, StoreEvent, StoreEventListener};
use crate::trie::NameTrie;
use crate::types::{Total, Value};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Default number of segments a store can track.
pub const DEFAULT_CAPACITY: usize = 64;

/// Configuration options for a [`SegmentStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of live segments. Fixed for the lifetime of the store.
    pub capacity: usize,
    /// Live length at or above which the interval table is rebuilt on the rayon pool.
    pub parallel_rebuild_threshold: usize,
    /// Structured event hook for observability (no-op by default).
    pub event_listener: Arc<dyn StoreEventListener>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            capacity: DEFAULT_CAPACITY,
            parallel_rebuild_threshold: DEFAULT_PARALLEL_REBUILD_THRESHOLD,
            event_listener: noop_event_listener(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SegmentStore {
    /// Slot-indexed measurements, `capacity` long. Slots `>= len()` hold the zero sentinel.
    values: Vec<Value>,
    /// Slot-indexed identifiers; its length is the live count.
    ids: Vec<String>,
    /// Slot-indexed free-text metadata.
    labels: Vec<Option<String>>,
    slots: HashMap<String, usize>,
    names: NameTrie,
    index: RangeIndexTable,
    config: StoreConfig,
}

impl SegmentStore {
    /// Creates an empty store for at most `capacity` segments with default settings.
    ///
    /// # Errors
    /// [`StoreError::ConfigError`] if `capacity` is zero or too large to allocate.
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        Self::with_config(StoreConfig {
            capacity,
            ..StoreConfig::default()
        })
    }

    /// Creates an empty store from `config`.
    ///
    /// The `floor(log2)` lookup is sized for `capacity` here and reused by every
    /// subsequent rebuild.
    ///
    /// # Errors
    /// [`StoreError::ConfigError`] if the capacity is zero or its buffers cannot be
    /// allocated.
    pub fn with_config(config: StoreConfig) -> Result<Self, StoreError> {
        if config.capacity == 0 {
            return Err(StoreError::ConfigError(
                "capacity must be a positive integer".to_string(),
            ));
        }
        let capacity = config.capacity;
        let alloc_err = |e: std::collections::TryReserveError| {
            StoreError::ConfigError(format!("cannot allocate store for capacity {}: {}", capacity, e))
        };

        let mut index = RangeIndexTable::try_with_capacity(capacity)?;
        index.set_parallel_threshold(config.parallel_rebuild_threshold);

        let mut values = Vec::new();
        values.try_reserve_exact(capacity).map_err(alloc_err)?;
        values.resize(capacity, 0);
        let mut ids = Vec::new();
        ids.try_reserve_exact(capacity).map_err(alloc_err)?;
        let mut labels = Vec::new();
        labels.try_reserve_exact(capacity).map_err(alloc_err)?;
        let mut slots = HashMap::new();
        slots.try_reserve(capacity).map_err(alloc_err)?;

        Ok(Self {
            values,
            ids,
            labels,
            slots,
            names: NameTrie::new(),
            index,
            config,
        })
    }

    /// Registers `id` in the next free slot with `initial_value` and rebuilds the index.
    ///
    /// # Returns
    /// The 1-based position assigned to `id`.
    ///
    /// # Errors
    /// `InvalidName` for an empty identifier, `DuplicateKey` if `id` is already tracked,
    /// `CapacityExceeded` if every slot is taken, `InvalidValue` for a negative count.
    pub fn add_entry(&mut self, id: &str, initial_value: Value) -> Result<usize, StoreError> {
        if id.is_empty() {
            return Err(self.reject("add", StoreError::InvalidName(id.to_string())));
        }
        if self.slots.contains_key(id) {
            return Err(self.reject("add", StoreError::DuplicateKey(id.to_string())));
        }
        if self.ids.len() == self.config.capacity {
            let capacity = self.config.capacity;
            return Err(self.reject("add", StoreError::CapacityExceeded { capacity }));
        }
        if initial_value < 0 {
            return Err(self.reject("add", StoreError::InvalidValue { value: initial_value }));
        }

        let slot = self.ids.len();
        self.ids.push(id.to_string());
        self.labels.push(None);
        self.values[slot] = initial_value;
        self.slots.insert(id.to_string(), slot);
        self.names.insert(id);

        store_metrics::record_mutation("add");
        self.config.event_listener.on_event(StoreEvent::EntryAdded {
            id: id.to_string(),
            slot,
            value: initial_value,
        });
        self.rebuild();
        Ok(slot + 1)
    }

    /// Stops tracking `id`, keeping live slots dense by moving the entry in the last
    /// live slot into the freed one (swap-remove), then rebuilds over the shorter array.
    ///
    /// Positions of every other entry are unchanged except the relocated one.
    ///
    /// # Returns
    /// The removed entry's last value.
    pub fn remove_entry(&mut self, id: &str) -> Result<Value, StoreError> {
        let Some(slot) = self.slots.remove(id) else {
            return Err(self.reject("remove", StoreError::UnknownKey(id.to_string())));
        };
        self.names.remove(id);

        let last = self.ids.len() - 1;
        let removed_value = self.values[slot];
        self.values[slot] = self.values[last];
        self.values[last] = 0;
        self.ids.swap_remove(slot);
        self.labels.swap_remove(slot);

        let relocated = if slot != last {
            let moved = self.ids[slot].clone();
            self.slots.insert(moved.clone(), slot);
            Some(moved)
        } else {
            None
        };

        store_metrics::record_mutation("remove");
        self.config.event_listener.on_event(StoreEvent::EntryRemoved {
            id: id.to_string(),
            slot,
            relocated,
        });
        self.rebuild();
        Ok(removed_value)
    }

    /// Sets the measurement for `id` and rebuilds the index.
    ///
    /// # Returns
    /// The previous value.
    pub fn update_value(&mut self, id: &str, new_value: Value) -> Result<Value, StoreError> {
        let Some(&slot) = self.slots.get(id) else {
            return Err(self.reject("update", StoreError::UnknownKey(id.to_string())));
        };
        if new_value < 0 {
            return Err(self.reject("update", StoreError::InvalidValue { value: new_value }));
        }

        let old = std::mem::replace(&mut self.values[slot], new_value);

        store_metrics::record_mutation("update");
        self.config.event_listener.on_event(StoreEvent::ValueUpdated {
            id: id.to_string(),
            slot,
            old,
            new: new_value,
        });
        self.rebuild();
        Ok(old)
    }

    pub fn get_value(&self, id: &str) -> Result<Value, StoreError> {
        self.slot(id).map(|slot| self.values[slot])
    }

    /// Maximum over live positions `start..=end` (1-based). Constant time.
    pub fn query_max(&self, start: usize, end: usize) -> Result<Value, StoreError> {
        let (left, right) = to_slot_range(start, end, self.len())?;
        self.index.query_max(left, right)
    }

    /// Minimum over live positions `start..=end` (1-based). Constant time.
    pub fn query_min(&self, start: usize, end: usize) -> Result<Value, StoreError> {
        let (left, right) = to_slot_range(start, end, self.len())?;
        self.index.query_min(left, right)
    }

    /// Mean over live positions `start..=end` (1-based), by direct scan of the slice.
    pub fn query_average(&self, start: usize, end: usize) -> Result<f64, StoreError> {
        let (left, right) = to_slot_range(start, end, self.len())?;
        Ok(slice_average(&self.values[left..=right]))
    }

    /// Sum over all live entries, by direct scan. Zero for an empty store.
    pub fn query_total(&self) -> Total {
        slice_total(self.live_values())
    }

    /// Live entries by descending value.
    ///
    /// The ranking is sorted in full when this is called, in `O(n log n)`, and the
    /// returned view only drains it. Call again after a mutation for a fresh ranking.
    pub fn ranked_view(&self) -> RankedView<'_> {
        RankedView::new(&self.ids, self.live_values())
    }

    /// Live entries in slot (position) order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.live_values().iter().copied())
    }

    /// 1-based position of `id`, usable as a bound in range queries.
    pub fn position_of(&self, id: &str) -> Result<usize, StoreError> {
        self.slot(id).map(|slot| slot + 1)
    }

    /// 0-based slot currently owned by `id`.
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Tracked identifiers starting with `prefix`, in lexicographic order. An empty
    /// prefix lists every identifier.
    pub fn ids_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.names.with_prefix(prefix)
    }

    /// Attaches free-text metadata to `id`, replacing any previous label. Does not touch
    /// measurements, so the index is not rebuilt.
    pub fn set_label(&mut self, id: &str, label: impl Into<String>) -> Result<(), StoreError> {
        let slot = self.slot(id)?;
        self.labels[slot] = Some(label.into());
        Ok(())
    }

    pub fn label(&self, id: &str) -> Result<Option<&str>, StoreError> {
        self.slot(id).map(|slot| self.labels[slot].as_deref())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Read-only view of the interval table backing range queries.
    pub fn index(&self) -> &RangeIndexTable {
        &self.index
    }

    /// Rebuilds the interval table from the live value array.
    ///
    /// Mutating calls already do this before they return; calling it again without an
    /// intervening mutation leaves the table unchanged.
    pub fn rebuild(&mut self) {
        let started = Instant::now();
        let len = self.ids.len();
        let stats = self.index.rebuild(&self.values[..len]);
        let elapsed = started.elapsed();

        store_metrics::record_rebuild(elapsed, len);
        self.config.event_listener.on_event(StoreEvent::IndexRebuilt {
            len: stats.len,
            levels: stats.levels,
            parallel: stats.parallel,
            elapsed,
        });
    }

    #[inline]
    fn live_values(&self) -> &[Value] {
        &self.values[..self.ids.len()]
    }

    fn slot(&self, id: &str) -> Result<usize, StoreError> {
        self.slots
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::UnknownKey(id.to_string()))
    }

    fn reject(&self, op: &'static str, err: StoreError) -> StoreError {
        store_metrics::record_rejected(op);
        self.config.event_listener.on_event(StoreEvent::MutationRejected {
            op,
            reason: err.to_string(),
        });
        err
    }
}
