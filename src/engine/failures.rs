// src/engine/failures.rs

/// First-failure bookkeeping indexed by Group start order.
///
/// Groups may finish in any order; each writes its failure into its own slot
/// and [`FailureSlots::first`] picks the lowest populated index, so the
/// reported code belongs to the earliest-started failing Group rather than
/// the one that happened to fail first.
#[derive(Debug, Clone, Default)]
pub struct FailureSlots {
    slots: Vec<Option<i32>>,
}

impl FailureSlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Record a failure for the Group at `index`. The first record for a slot
    /// wins; out-of-range indices are ignored.
    pub fn record(&mut self, index: usize, code: i32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.get_or_insert(code);
        }
    }

    /// Code of the lowest-index failure, if any Group failed.
    pub fn first(&self) -> Option<i32> {
        self.slots.iter().flatten().next().copied()
    }

    pub fn failure_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
