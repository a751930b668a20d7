//! Contiguous first-fit pool.
//!
//! [`SlotArena`] hands out runs of `n` adjacent slots from a fixed pool of
//! `N`. Occupancy lives in a flat table index-aligned with the backing
//! buffer; allocation scans it left to right and takes the earliest free
//! run that is long enough. Both directions are O(N). Freed runs are not
//! coalesced or compacted, so fragmentation is possible.

use std::fmt;
use std::ptr::NonNull;

use fixpool_core::{ArenaStats, PoolAllocator, PoolError, SlotIndex, SlotState};
use tracing::{debug, trace, warn};

use crate::config::ArenaConfig;
use crate::raw::BackingBuffer;

/// Fixed pool of `N` slots of `T` serving contiguous multi-slot requests.
///
/// Not `Clone`: two arenas must never believe they own the same buffer.
/// Use [`PoolAllocator::fresh`] to get a new empty arena of the same kind.
///
/// Dropping the arena releases the buffer without dropping any values
/// still constructed in it.
pub struct SlotArena<T, const N: usize> {
    buffer: BackingBuffer<T>,
    /// `state[i] == Taken` iff slot `i` is reserved.
    state: Box<[SlotState]>,
    config: ArenaConfig,
    stats: ArenaStats,
}

impl<T, const N: usize> SlotArena<T, N> {
    /// Create an empty arena with the default configuration.
    pub fn new() -> Result<Self, PoolError> {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an empty arena with the given configuration.
    ///
    /// Fails for zero-sized `T` or when `N` elements of `T` exceed the
    /// largest possible allocation.
    pub fn with_config(config: ArenaConfig) -> Result<Self, PoolError> {
        let buffer = BackingBuffer::new(N)?;
        debug!(arena = config.label, capacity = N, "slot arena created");
        Ok(Self {
            state: vec![SlotState::Free; buffer.len()].into_boxed_slice(),
            buffer,
            config,
            stats: ArenaStats::new(N),
        })
    }

    /// Reserve `n` contiguous slots, first-fit.
    ///
    /// Returns a pointer to the first slot of the earliest free run of at
    /// least `n` slots, or `None` if no such run exists. A failed request
    /// reserves nothing.
    ///
    /// `n == 0` returns a dangling, well-aligned pointer without scanning;
    /// it addresses no slot and releasing it is a no-op.
    pub fn allocate(&mut self, n: usize) -> Option<NonNull<T>> {
        if n == 0 {
            return Some(NonNull::dangling());
        }

        let Some(start) = self.find_run(n) else {
            self.stats.record_failure();
            debug!(
                arena = self.config.label,
                requested = n,
                largest_free_run = self.largest_free_run(),
                "no free run long enough"
            );
            return None;
        };

        self.state[start..start + n].fill(SlotState::Taken);
        if let Some(byte) = self.config.alloc_pattern {
            self.buffer.fill(start, n, byte);
        }
        self.stats.record_alloc(n);
        trace!(arena = self.config.label, slot = start, count = n, "allocated run");
        Some(self.buffer.slot_ptr(start))
    }

    /// Release `n` slots starting at `p`.
    ///
    /// `p` and `n` must match an earlier [`allocate`](Self::allocate).
    /// Pointers that address no slot of this arena are ignored. A run that
    /// would extend past the last slot is clamped to it.
    pub fn deallocate(&mut self, p: NonNull<T>, n: usize) {
        if n == 0 {
            return;
        }

        let Some(start) = self.buffer.index_of(p) else {
            self.stats.record_ignored();
            warn!(
                arena = self.config.label,
                count = n,
                "ignoring release of a pointer outside the arena"
            );
            return;
        };

        let end = start.saturating_add(n).min(N);
        let run = &mut self.state[start..end];
        let released = run.iter().filter(|s| s.is_taken()).count();
        run.fill(SlotState::Free);

        if let Some(byte) = self.config.dealloc_pattern {
            self.buffer.fill(start, end - start, byte);
        }
        if released == 0 {
            self.stats.record_ignored();
        } else {
            self.stats.record_dealloc(released);
        }
        trace!(arena = self.config.label, slot = start, count = end - start, "released run");
    }

    /// Move `value` into the slot at `p`. Bookkeeping is untouched.
    ///
    /// # Safety
    ///
    /// `p` must address a slot of this arena reserved by an outstanding
    /// allocation. A value already there is overwritten without being
    /// dropped.
    #[allow(unsafe_code)]
    pub unsafe fn construct(&self, p: NonNull<T>, value: T) {
        debug_assert!(self.contains(p), "construct outside arena");
        // SAFETY: forwarded caller contract.
        unsafe { self.buffer.write(p, value) };
    }

    /// Drop the value at `p` in place. Bookkeeping is untouched.
    ///
    /// # Safety
    ///
    /// `p` must address a reserved slot of this arena holding a value
    /// placed there by [`construct`](Self::construct) and not yet destroyed.
    #[allow(unsafe_code)]
    pub unsafe fn destroy(&self, p: NonNull<T>) {
        debug_assert!(self.contains(p), "destroy outside arena");
        // SAFETY: forwarded caller contract.
        unsafe { self.buffer.drop_in_place(p) };
    }

    /// Start index of the earliest free run of at least `n` slots.
    fn find_run(&self, n: usize) -> Option<usize> {
        let mut run_start = 0;
        let mut run_len = 0;
        for (i, state) in self.state.iter().enumerate() {
            if run_len >= n {
                break;
            }
            if state.is_free() {
                if run_len == 0 {
                    run_start = i;
                }
                run_len += 1;
            } else {
                run_len = 0;
            }
        }
        (run_len >= n).then_some(run_start)
    }

    /// Number of slots; always `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Same as [`capacity`](Self::capacity).
    pub const fn max_size(&self) -> usize {
        N
    }

    /// Occupancy of slot `index`, or `None` if out of range.
    pub fn state(&self, index: SlotIndex) -> Option<SlotState> {
        self.state.get(index.0).copied()
    }

    /// The whole occupancy table, index-aligned with the slots.
    pub fn occupancy(&self) -> &[SlotState] {
        &self.state
    }

    /// Number of free slots, contiguous or not.
    pub fn free_count(&self) -> usize {
        self.state.iter().filter(|s| s.is_free()).count()
    }

    /// Length of the longest run of free slots.
    pub fn largest_free_run(&self) -> usize {
        let mut best = 0;
        let mut run = 0;
        for state in self.state.iter() {
            if state.is_free() {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best
    }

    /// Pointer to slot `index`, or `None` if out of range.
    pub fn slot_ptr(&self, index: SlotIndex) -> Option<NonNull<T>> {
        (index.0 < N).then(|| self.buffer.slot_ptr(index.0))
    }

    /// Slot addressed by `p`, if it points at one of this arena's slots.
    pub fn slot_index(&self, p: NonNull<T>) -> Option<SlotIndex> {
        self.buffer.index_of(p).map(SlotIndex)
    }

    /// Whether `p` points at one of this arena's slots.
    pub fn contains(&self, p: NonNull<T>) -> bool {
        self.buffer.index_of(p).is_some()
    }

    /// The configuration this arena was created with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }
}

impl<T, const N: usize> PoolAllocator<T> for SlotArena<T, N> {
    fn allocate(&mut self, count: usize) -> Result<NonNull<T>, PoolError> {
        SlotArena::allocate(self, count).ok_or(PoolError::Exhausted {
            requested: count,
            capacity: N,
        })
    }

    fn deallocate(&mut self, ptr: NonNull<T>, count: usize) {
        SlotArena::deallocate(self, ptr, count);
    }

    #[allow(unsafe_code)]
    unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: forwarded caller contract.
        unsafe { SlotArena::construct(self, ptr, value) };
    }

    #[allow(unsafe_code)]
    unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: forwarded caller contract.
        unsafe { SlotArena::destroy(self, ptr) };
    }

    fn max_size(&self) -> usize {
        N
    }

    fn fresh(&self) -> Result<Self, PoolError> {
        Self::with_config(self.config.clone())
    }

    fn stats(&self) -> ArenaStats {
        self.stats
    }
}

/// Arenas of the same type and capacity are interchangeable.
impl<T, const N: usize> PartialEq for SlotArena<T, N> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T, const N: usize> Eq for SlotArena<T, N> {}

impl<T, const N: usize> fmt::Debug for SlotArena<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotArena")
            .field("label", &self.config.label)
            .field("capacity", &N)
            .field("in_use", &self.stats.in_use)
            .finish_non_exhaustive()
    }
}
