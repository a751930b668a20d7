//! Point-in-time usage counters for an arena.

use std::fmt;

/// Snapshot of an arena's usage counters.
///
/// All slot counts are in elements, not bytes. Counters are cumulative
/// since construction; `in_use` and `peak_in_use` describe occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total number of slots the arena owns.
    pub capacity: usize,
    /// Slots currently reserved by outstanding allocations.
    pub in_use: usize,
    /// Highest value `in_use` has reached.
    pub peak_in_use: usize,
    /// Successful allocate calls.
    pub allocations: u64,
    /// Deallocate calls that released at least one slot.
    pub deallocations: u64,
    /// Allocate calls that failed for lack of space.
    pub failed_allocations: u64,
    /// Deallocate calls refused because the arena cannot honour them, such
    /// as a foreign pointer or an already free run. Null releases and
    /// releases into an arena with every slot free are not counted.
    pub ignored_deallocations: u64,
}

impl ArenaStats {
    /// Create zeroed counters for an arena of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Slots currently free.
    pub fn free(&self) -> usize {
        self.capacity - self.in_use
    }

    /// Fraction of capacity in use, in `[0.0, 1.0]`.
    ///
    /// An arena of capacity zero reports full utilisation.
    pub fn utilisation(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.in_use as f64 / self.capacity as f64
    }

    /// Record a successful reservation of `slots` slots.
    pub fn record_alloc(&mut self, slots: usize) {
        self.allocations += 1;
        self.in_use += slots;
        self.peak_in_use = self.peak_in_use.max(self.in_use);
    }

    /// Record a release of `slots` slots.
    pub fn record_dealloc(&mut self, slots: usize) {
        self.deallocations += 1;
        self.in_use = self.in_use.saturating_sub(slots);
    }

    /// Record a failed allocate call.
    pub fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    /// Record a deallocate call that changed nothing.
    pub fn record_ignored(&mut self) {
        self.ignored_deallocations += 1;
    }
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} slots in use (peak {}), {} allocs, {} frees, {} failed",
            self.in_use,
            self.capacity,
            self.peak_in_use,
            self.allocations,
            self.deallocations,
            self.failed_allocations
        )
    }
}
