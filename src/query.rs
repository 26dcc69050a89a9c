use crate::error::StoreError;
use crate::types::{Total, Value};

/// Validates a 1-based inclusive position range against `count` live entries and
/// converts it to 0-based slot bounds.
///
/// # Returns
/// * `Ok((left, right))` with `0 <= left <= right < count`.
/// * `Err(StoreError::InvalidRange)` if `start < 1`, `end > count`, or `start > end`,
///   carrying the caller's original 1-based bounds.
pub(crate) fn to_slot_range(start: usize, end: usize, count: usize) -> Result<(usize, usize), StoreError> {
    if start < 1 || end > count || start > end {
        return Err(StoreError::InvalidRange { start, end, count });
    }
    Ok((start - 1, end - 1))
}

/// Sum of a slice of measurements. Linear scan; sums double-count on overlap, so they
/// are never routed through the interval table.
#[inline]
pub(crate) fn slice_total(values: &[Value]) -> Total {
    values.iter().map(|&v| Total::from(v)).sum()
}

/// Arithmetic mean of a non-empty slice.
#[inline]
pub(crate) fn slice_average(values: &[Value]) -> f64 {
    debug_assert!(!values.is_empty());
    slice_total(values) as f64 / values.len() as f64
}

/// Live entries ordered by value, highest first.
///
/// Not lazy: the whole ranking is collected and sorted when the view is created by
/// [`crate::SegmentStore::ranked_view`], and iteration drains that buffer. Equal values
/// keep their slot order (the sort is stable), so the sequence is deterministic for a
/// given store state.
#[derive(Debug, Clone)]
pub struct RankedView<'a> {
    inner: std::vec::IntoIter<(&'a str, Value)>,
}

impl<'a> RankedView<'a> {
    pub(crate) fn new(ids: &'a [String], values: &'a [Value]) -> Self {
        let mut ranked: Vec<(&'a str, Value)> = ids
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Self {
            inner: ranked.into_iter(),
        }
    }
}

impl<'a> Iterator for RankedView<'a> {
    type Item = (&'a str, Value);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RankedView<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_to_slot_range() {
        assert_eq!(to_slot_range(1, 5, 5).unwrap(), (0, 4));
        assert_eq!(to_slot_range(3, 3, 5).unwrap(), (2, 2));

        // Zero start, past the end, inverted.
        assert!(to_slot_range(0, 2, 5).is_err());
        assert!(to_slot_range(1, 6, 5).is_err());
        assert!(to_slot_range(4, 2, 5).is_err());

        // Empty store rejects everything, including the degenerate (1, 0).
        assert_eq!(
            to_slot_range(1, 5, 0),
            Err(StoreError::InvalidRange {
                start: 1,
                end: 5,
                count: 0
            })
        );
        assert!(to_slot_range(1, 0, 0).is_err());
    }

    #[test]
    fn test_slice_total_and_average() {
        assert_eq!(slice_total(&[]), 0);
        assert_eq!(slice_total(&[Value::MAX, Value::MAX]), 2 * Total::from(Value::MAX));
        let avg = slice_average(&[10, 20, 5]);
        assert!((avg - 35.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranked_view_is_sorted_before_first_next() {
        let names = ids(&["a", "b", "c"]);
        let values = [1, 3, 2];
        let mut view = RankedView::new(&names, &values);
        assert_eq!(view.size_hint(), (3, Some(3)));
        assert_eq!(view.next(), Some(("b", 3)));
        let rest = view.clone();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest.collect::<Vec<_>>(), vec![("c", 2), ("a", 1)]);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_ranked_view_orders_descending_and_is_stable() {
        let names = ids(&["a", "b", "c", "d", "e"]);
        let values = [10, 30, 10, 30, 5];
        let view = RankedView::new(&names, &values);
        assert_eq!(view.len(), 5);
        let got: Vec<_> = view.collect();
        assert_eq!(got, vec![("b", 30), ("d", 30), ("a", 10), ("c", 10), ("e", 5)]);
    }

    #[test]
    fn test_ranked_view_empty() {
        let names: Vec<String> = Vec::new();
        assert_eq!(RankedView::new(&names, &[]).next(), None);
    }
}
