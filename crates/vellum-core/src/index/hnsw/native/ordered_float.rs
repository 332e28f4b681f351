//! Total ordering wrapper for distances stored in heaps.

/// Wrapper for f32 to implement Ord for `BinaryHeap`.
///
/// Uses `f32::total_cmp`, so NaN sorts after every finite distance instead
/// of poisoning comparisons.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderedFloat(pub(crate) f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}
