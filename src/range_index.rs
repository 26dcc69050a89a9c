//! Power-of-two interval table (sparse table) for constant-time range maximum and
//! minimum queries over a fixed snapshot of values.
//!
//! Level `j` holds, for every start position `i` with `i + 2^j <= n`, the aggregate of
//! the window `[i, i + 2^j)`. Levels are stored level-major (one `Vec` per level, each
//! `n - 2^j + 1` long) so a level can be produced from the previous one in a single
//! pass, optionally in parallel. Max and min are maintained side by side and share
//! the `floor(log2)` lookup table.
//!
//! The table is read-only once built. Callers that mutate the underlying values must
//! call [`RangeIndexTable::rebuild`] before the next query; the build is a pure
//! function of its input and does not look at previous table contents.

use crate::error::StoreError;
use crate::types::{Aggregate, Value};
use rayon::prelude::*;

/// Default length at or above which levels are built on the rayon pool.
pub const DEFAULT_PARALLEL_REBUILD_THRESHOLD: usize = 4096;

/// Summary of a single rebuild, used for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    /// Logical length the table now covers.
    pub len: usize,
    /// Number of doubling levels (`floor(log2(len)) + 1`, or 0 when empty).
    pub levels: usize,
    /// Whether levels were computed on the rayon pool.
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeIndexTable {
    /// `log[k] = floor(log2(k))` for `1 <= k < log.len()`. Depends only on capacity.
    log: Vec<u32>,
    len: usize,
    max_levels: Vec<Vec<Value>>,
    min_levels: Vec<Vec<Value>>,
    parallel_threshold: usize,
}

impl Default for RangeIndexTable {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl RangeIndexTable {
    /// Creates an empty table whose log lookup already covers `capacity` elements.
    ///
    /// # Panics
    /// Panics if the lookup for `capacity` cannot be allocated. Use
    /// [`Self::try_with_capacity`] for caller-supplied sizes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut log = Vec::with_capacity(capacity.saturating_add(1));
        extend_log_table(&mut log, capacity);
        Self::from_log(log)
    }

    /// Fallible [`Self::with_capacity`].
    ///
    /// # Errors
    /// [`StoreError::ConfigError`] if `capacity + 1` overflows or the lookup table
    /// cannot be allocated.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, StoreError> {
        let slots = capacity.checked_add(1).ok_or_else(|| {
            StoreError::ConfigError(format!("capacity {} is too large", capacity))
        })?;
        let mut log = Vec::new();
        log.try_reserve_exact(slots).map_err(|e| {
            StoreError::ConfigError(format!("cannot allocate index for capacity {}: {}", capacity, e))
        })?;
        extend_log_table(&mut log, capacity);
        Ok(Self::from_log(log))
    }

    fn from_log(log: Vec<u32>) -> Self {
        Self {
            log,
            len: 0,
            max_levels: Vec::new(),
            min_levels: Vec::new(),
            parallel_threshold: DEFAULT_PARALLEL_REBUILD_THRESHOLD,
        }
    }

    /// Builds a table over `values` in `O(n log n)` time and space.
    pub fn build(values: &[Value]) -> Self {
        let mut table = Self::with_capacity(values.len());
        table.rebuild(values);
        table
    }

    /// Sets the length at or above which [`Self::rebuild`] uses the rayon pool.
    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        self.parallel_threshold = threshold;
    }

    /// Discards all derived state and recomputes both tables from `values`.
    ///
    /// Full reconstruction on every call is deliberate. An incremental point update
    /// touches `O(n)` windows in the worst case anyway (every window covering the
    /// slot, across all levels), so for update-heavy workloads with few queries in
    /// between it is no better asymptotically, and a wholesale rebuild cannot leave
    /// a stale window behind.
    ///
    /// Level buffers are reused across calls, so repeated rebuilds at a stable length
    /// do not reallocate.
    pub fn rebuild(&mut self, values: &[Value]) -> RebuildStats {
        let n = values.len();
        if n + 1 > self.log.len() {
            extend_log_table(&mut self.log, n);
        }
        let parallel = n >= self.parallel_threshold && n > 1;
        self.len = n;
        build_levels(&mut self.max_levels, values, &self.log, Aggregate::Max, parallel);
        build_levels(&mut self.min_levels, values, &self.log, Aggregate::Min, parallel);
        RebuildStats {
            len: n,
            levels: self.max_levels.len(),
            parallel,
        }
    }

    /// Aggregate of the inclusive 0-based window `[left, right]`.
    ///
    /// With `j = floor(log2(right - left + 1))` the window is exactly covered by the
    /// two length-`2^j` windows starting at `left` and at `right - 2^j + 1`. They may
    /// overlap, which is harmless because max and min are idempotent.
    ///
    /// # Errors
    /// [`StoreError::InvalidRange`] if the table is empty, `left > right`, or
    /// `right >= len`.
    pub fn query(&self, aggregate: Aggregate, left: usize, right: usize) -> Result<Value, StoreError> {
        if self.len == 0 || left > right || right >= self.len {
            return Err(StoreError::InvalidRange {
                start: left,
                end: right,
                count: self.len,
            });
        }
        let j = self.log[right - left + 1] as usize;
        let row = &self.levels(aggregate)[j];
        Ok(aggregate.combine(row[left], row[right + 1 - (1usize << j)]))
    }

    #[inline]
    pub fn query_max(&self, left: usize, right: usize) -> Result<Value, StoreError> {
        self.query(Aggregate::Max, left, right)
    }

    #[inline]
    pub fn query_min(&self, left: usize, right: usize) -> Result<Value, StoreError> {
        self.query(Aggregate::Min, left, right)
    }

    /// Number of values covered by the last rebuild.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of doubling levels currently held.
    pub fn depth(&self) -> usize {
        self.max_levels.len()
    }

    /// Row of window aggregates for level `j` (windows of length `2^j`), if present.
    pub fn level(&self, aggregate: Aggregate, j: usize) -> Option<&[Value]> {
        self.levels(aggregate).get(j).map(Vec::as_slice)
    }

    /// `floor(log2(k))` from the lookup table, for `1 <= k <= ` the largest length seen.
    pub fn log2(&self, k: usize) -> Option<u32> {
        if k == 0 {
            return None;
        }
        self.log.get(k).copied()
    }

    fn levels(&self, aggregate: Aggregate) -> &[Vec<Value>] {
        match aggregate {
            Aggregate::Max => &self.max_levels,
            Aggregate::Min => &self.min_levels,
        }
    }
}

/// Grows `log` so that `log[k] = floor(log2(k))` holds for every `k <= upto`.
/// `log[0]` is a placeholder and never read by queries.
fn extend_log_table(log: &mut Vec<u32>, upto: usize) {
    if log.is_empty() {
        log.push(0);
    }
    for k in log.len()..=upto {
        let v = if k == 1 { 0 } else { log[k / 2] + 1 };
        log.push(v);
    }
}

fn build_levels(
    levels: &mut Vec<Vec<Value>>,
    values: &[Value],
    log: &[u32],
    aggregate: Aggregate,
    parallel: bool,
) {
    let n = values.len();
    let depth = if n == 0 { 0 } else { log[n] as usize + 1 };
    levels.truncate(depth);
    levels.resize_with(depth, Vec::new);
    if depth == 0 {
        return;
    }

    levels[0].clear();
    levels[0].extend_from_slice(values);

    for j in 1..depth {
        let half = 1usize << (j - 1);
        let width = n - (1usize << j) + 1;
        let (lower, upper) = levels.split_at_mut(j);
        let prev = &lower[j - 1];
        let cur = &mut upper[0];
        if parallel {
            (0..width)
                .into_par_iter()
                .map(|i| aggregate.combine(prev[i], prev[i + half]))
                .collect_into_vec(cur);
        } else {
            cur.clear();
            cur.extend((0..width).map(|i| aggregate.combine(prev[i], prev[i + half])));
        }
    }
}
