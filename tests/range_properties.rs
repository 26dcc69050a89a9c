//! Property-based and seeded randomized checks: every range answer must match a direct
//! scan of the live values, and live slots must stay dense, across arbitrary operation
//! sequences.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use segment_index::*;

const SEED: u64 = 0x5345_474D_454E_5453;

/// Reference model: live values in position order, kept by the same swap-remove rule.
#[derive(Debug, Default)]
struct Model {
    ids: Vec<String>,
    values: Vec<Value>,
}

impl Model {
    fn add(&mut self, id: &str, v: Value) {
        self.ids.push(id.to_string());
        self.values.push(v);
    }

    fn remove(&mut self, id: &str) {
        let i = self.ids.iter().position(|x| x == id).unwrap();
        self.ids.swap_remove(i);
        self.values.swap_remove(i);
    }

    fn update(&mut self, id: &str, v: Value) {
        let i = self.ids.iter().position(|x| x == id).unwrap();
        self.values[i] = v;
    }
}

fn check_against_model(store: &SegmentStore, model: &Model) {
    let n = model.values.len();
    assert_eq!(store.len(), n);
    assert_eq!(
        store.entries().map(|(id, v)| (id.to_string(), v)).collect::<Vec<_>>(),
        model.ids.iter().cloned().zip(model.values.iter().copied()).collect::<Vec<_>>()
    );
    for (slot, id) in model.ids.iter().enumerate() {
        assert_eq!(store.slot_of(id), Some(slot));
    }
    assert_eq!(store.query_total(), model.values.iter().map(|&v| v as Total).sum::<Total>());
    for l in 1..=n {
        for r in l..=n {
            let slice = &model.values[l - 1..r];
            assert_eq!(store.query_max(l, r).unwrap(), *slice.iter().max().unwrap());
            assert_eq!(store.query_min(l, r).unwrap(), *slice.iter().min().unwrap());
            let expected = slice.iter().map(|&v| v as f64).sum::<f64>() / slice.len() as f64;
            assert!((store.query_average(l, r).unwrap() - expected).abs() < 1e-6);
        }
    }
}

#[test]
fn randomized_operations_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let capacity = 24;
    let mut store = SegmentStore::new(capacity).unwrap();
    let mut model = Model::default();
    let mut next_id = 0u32;

    for _ in 0..400 {
        let op = rng.random_range(0..10);
        if (op < 4 && model.ids.len() < capacity) || model.ids.is_empty() {
            let id = format!("seg-{}", next_id);
            next_id += 1;
            let v = rng.random_range(0..1_000);
            store.add_entry(&id, v).unwrap();
            model.add(&id, v);
        } else if op < 7 {
            let id = model.ids[rng.random_range(0..model.ids.len())].clone();
            let v = rng.random_range(0..1_000);
            store.update_value(&id, v).unwrap();
            model.update(&id, v);
        } else {
            let id = model.ids[rng.random_range(0..model.ids.len())].clone();
            store.remove_entry(&id).unwrap();
            model.remove(&id);
        }
        check_against_model(&store, &model);
    }
}

#[test]
fn parallel_rebuild_store_matches_sequential_store() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ 1);
    let capacity = 600;
    let mut sequential = SegmentStore::with_config(StoreConfig {
        capacity,
        parallel_rebuild_threshold: usize::MAX,
        ..StoreConfig::default()
    })
    .unwrap();
    let mut parallel = SegmentStore::with_config(StoreConfig {
        capacity,
        parallel_rebuild_threshold: 2,
        ..StoreConfig::default()
    })
    .unwrap();

    for i in 0..capacity {
        let v = rng.random_range(0..100_000);
        sequential.add_entry(&i.to_string(), v).unwrap();
        parallel.add_entry(&i.to_string(), v).unwrap();
    }
    for j in 0..sequential.index().depth() {
        for agg in [Aggregate::Max, Aggregate::Min] {
            assert_eq!(sequential.index().level(agg, j), parallel.index().level(agg, j));
        }
    }
    for _ in 0..500 {
        let l = rng.random_range(1..=capacity);
        let r = rng.random_range(l..=capacity);
        assert_eq!(sequential.query_max(l, r), parallel.query_max(l, r));
        assert_eq!(sequential.query_min(l, r), parallel.query_min(l, r));
    }
}

proptest! {
    // Non-power-of-two windows are answered from two overlapping power-of-two windows.
    #[test]
    fn table_matches_scan_for_any_window(
        values in prop::collection::vec(-10_000i32..10_000, 1..200),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let table = RangeIndexTable::build(&values);
        let (l, r) = {
            let x = a.index(values.len());
            let y = b.index(values.len());
            (x.min(y), x.max(y))
        };
        prop_assert_eq!(table.query_max(l, r).unwrap(), *values[l..=r].iter().max().unwrap());
        prop_assert_eq!(table.query_min(l, r).unwrap(), *values[l..=r].iter().min().unwrap());
    }

    #[test]
    fn rebuild_is_pure(
        first in prop::collection::vec(0i32..1_000, 0..100),
        second in prop::collection::vec(0i32..1_000, 0..100),
    ) {
        let mut table = RangeIndexTable::with_capacity(100);
        table.rebuild(&first);
        table.rebuild(&second);
        let mut fresh = RangeIndexTable::with_capacity(100);
        fresh.rebuild(&second);
        prop_assert_eq!(table, fresh);
    }

    #[test]
    fn live_slots_stay_dense(ops in prop::collection::vec((any::<bool>(), 0usize..12), 1..80)) {
        let mut store = SegmentStore::new(12).unwrap();
        for (add, k) in ops {
            let id = format!("k{}", k);
            if add {
                let _ = store.add_entry(&id, k as Value);
            } else {
                let _ = store.remove_entry(&id);
            }
            let mut slots: Vec<usize> = store
                .entries()
                .filter_map(|(id, _)| store.slot_of(id))
                .collect();
            slots.sort_unstable();
            prop_assert_eq!(slots, (0..store.len()).collect::<Vec<_>>());
            prop_assert_eq!(store.index().len(), store.len());
        }
    }
}
