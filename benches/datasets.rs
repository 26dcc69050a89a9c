use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use segment_index::Value;

pub const DEFAULT_SEED: u64 = 0x_5345_474D_4958_4245; // fixed seed for stable benchmarks

#[derive(Clone, Debug)]
pub struct Segment {
    pub id: String,
    pub count: Value,
}

/// `segments` road segments with vehicle counts drawn uniformly from `0..max_count`.
pub fn generate_segments(seed: u64, segments: usize, max_count: Value) -> Vec<Segment> {
    assert!(max_count > 0);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..segments)
        .map(|i| Segment {
            id: format!("segment_{}", i),
            count: rng.random_range(0..max_count),
        })
        .collect()
}

/// Deterministic 1-based inclusive query ranges over `len` positions.
pub fn generate_ranges(seed: u64, len: usize, queries: usize) -> Vec<(usize, usize)> {
    assert!(len > 0);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..queries)
        .map(|_| {
            let l = rng.random_range(1..=len);
            let r = rng.random_range(l..=len);
            (l, r)
        })
        .collect()
}
