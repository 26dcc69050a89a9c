/// Measurement type (vehicle count on a road segment).
pub type Value = i32;

/// Sum type for totals over the live value array. Wide enough that summing
/// every slot of any addressable store cannot overflow.
pub type Total = i64;

/// Idempotent combine operation maintained by the range index.
///
/// Both variants tolerate overlap: combining a window with itself yields the
/// window, which is what lets a query cover `[L, R]` with two power-of-two
/// windows that may share elements. Sums do not have this property and are
/// therefore never served by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Max,
    Min,
}

impl Aggregate {
    #[inline]
    pub fn combine(self, a: Value, b: Value) -> Value {
        match self {
            Aggregate::Max => a.max(b),
            Aggregate::Min => a.min(b),
        }
    }
}
