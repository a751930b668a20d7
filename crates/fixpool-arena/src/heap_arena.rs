//! Heap-prioritised single-slot pool.
//!
//! [`HeapArena`] hands out one slot at a time. Instead of scanning an
//! occupancy table it keeps an explicit binary max-heap of entries ordered
//! by [`SlotState`] (`Free > Taken`), so the root of the active heap is
//! always a free slot.
//!
//! # Layout of the bookkeeping table
//!
//! ```text
//!  0                available                N
//!  ├── free heap ──────┤├──── taken, flat ────┤
//!  [F p][F p][F p][F p] [T -][T -][T -][T -]
//! ```
//!
//! `available` is the heap boundary. Allocation pops the root (swap with
//! the last heap entry, sift down) and shrinks the heap by one; the entry
//! that falls out of the heap is overwritten with `Taken` and a cleared
//! pointer. Deallocation writes a `Free` entry at the boundary, grows the
//! heap by one, and sifts it up. Both are O(log N); the initial heapify is
//! O(N) and runs once.

use std::fmt;
use std::ptr::NonNull;

use fixpool_core::{ArenaStats, PoolAllocator, PoolError, SlotIndex, SlotState};
use tracing::{debug, trace, warn};

use crate::config::ArenaConfig;
use crate::raw::BackingBuffer;

/// One bookkeeping record: a slot's state and, while free, its address.
struct HeapEntry<T> {
    state: SlotState,
    ptr: Option<NonNull<T>>,
}

impl<T> HeapEntry<T> {
    fn free(ptr: NonNull<T>) -> Self {
        Self {
            state: SlotState::Free,
            ptr: Some(ptr),
        }
    }

    fn taken() -> Self {
        Self {
            state: SlotState::Taken,
            ptr: None,
        }
    }
}

/// Fixed pool of `N` slots of `T` serving single-element requests.
///
/// Not `Clone`: two arenas must never believe they own the same buffer.
/// Use [`PoolAllocator::fresh`] to get a new empty arena of the same kind.
///
/// Dropping the arena releases the buffer without dropping any values
/// still constructed in it.
pub struct HeapArena<T, const N: usize> {
    buffer: BackingBuffer<T>,
    /// `[0, available)` is a max-heap of free entries; the rest are taken.
    entries: Box<[HeapEntry<T>]>,
    available: usize,
    config: ArenaConfig,
    stats: ArenaStats,
}

impl<T, const N: usize> HeapArena<T, N> {
    /// Create an empty arena with the default configuration.
    pub fn new() -> Result<Self, PoolError> {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an empty arena with the given configuration.
    ///
    /// Every slot starts free and the table is heapified once. Fails for
    /// zero-sized `T` or when `N` elements of `T` exceed the largest
    /// possible allocation.
    pub fn with_config(config: ArenaConfig) -> Result<Self, PoolError> {
        let buffer = BackingBuffer::new(N)?;
        let entries = (0..buffer.len())
            .map(|i| HeapEntry::free(buffer.slot_ptr(i)))
            .collect::<Box<[_]>>();

        let mut arena = Self {
            buffer,
            entries,
            available: N,
            config,
            stats: ArenaStats::new(N),
        };
        arena.heapify();
        debug!(arena = arena.config.label, capacity = N, "heap arena created");
        Ok(arena)
    }

    /// Pop one free slot off the heap.
    ///
    /// Returns [`PoolError::Exhausted`] when no slot is free. The error is
    /// explicit so that an exhausted pool is never confused with a valid
    /// address.
    pub fn allocate(&mut self) -> Result<NonNull<T>, PoolError> {
        if self.available == 0 {
            self.stats.record_failure();
            debug!(arena = self.config.label, capacity = N, "heap arena exhausted");
            return Err(PoolError::Exhausted {
                requested: 1,
                capacity: N,
            });
        }

        let ptr = self.entries[0]
            .ptr
            .expect("root of a non-empty free heap always carries a slot");

        let last = self.available - 1;
        self.entries.swap(0, last);
        self.sift_down(0, last);
        self.available = last;
        self.entries[last] = HeapEntry::taken();

        if let Some(byte) = self.config.alloc_pattern {
            if let Some(index) = self.buffer.index_of(ptr) {
                self.buffer.fill(index, 1, byte);
            }
        }
        self.stats.record_alloc(1);
        trace!(
            arena = self.config.label,
            available = self.available,
            "allocated slot"
        );
        Ok(ptr)
    }

    /// Push a slot back onto the free heap.
    ///
    /// Null pointers are ignored, as are calls made while every slot is
    /// already free; neither touches any state, counters included. When
    /// [`ArenaConfig::verify_foreign_pointers`] is set, pointers that do not
    /// address one of this arena's slots are ignored too and counted in
    /// [`ArenaStats::ignored_deallocations`]; otherwise they are trusted.
    ///
    /// O(log N). Debug builds also scan the free heap for a double release,
    /// which makes each call O(N) there.
    pub fn deallocate(&mut self, ptr: *mut T) {
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };
        if self.available >= N {
            warn!(
                arena = self.config.label,
                "ignoring release into an arena with no outstanding slots"
            );
            return;
        }

        let index = self.buffer.index_of(ptr);
        if index.is_none() && self.config.verify_foreign_pointers {
            self.stats.record_ignored();
            warn!(
                arena = self.config.label,
                "ignoring release of a pointer outside the arena"
            );
            return;
        }
        // Linear scan; compiled out of release builds.
        #[cfg(debug_assertions)]
        assert!(
            !self.entries[..self.available]
                .iter()
                .any(|e| e.ptr == Some(ptr)),
            "slot released twice"
        );

        if let (Some(byte), Some(index)) = (self.config.dealloc_pattern, index) {
            self.buffer.fill(index, 1, byte);
        }

        let slot = self.available;
        self.entries[slot] = HeapEntry::free(ptr);
        self.available += 1;
        self.sift_up(slot);

        self.stats.record_dealloc(1);
        trace!(
            arena = self.config.label,
            available = self.available,
            "released slot"
        );
    }

    /// Move `value` into the slot at `ptr`. Bookkeeping is untouched.
    ///
    /// # Safety
    ///
    /// `ptr` must address a slot of this arena reserved by an outstanding
    /// allocation. A value already there is overwritten without being
    /// dropped. With pointer verification off, a trusted foreign pointer
    /// handed back by [`allocate`](Self::allocate) is accepted too.
    #[allow(unsafe_code)]
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        debug_assert!(self.accepts(ptr), "construct outside arena");
        // SAFETY: forwarded caller contract.
        unsafe { self.buffer.write(ptr, value) };
    }

    /// Drop the value at `ptr` in place. Bookkeeping is untouched.
    ///
    /// # Safety
    ///
    /// `ptr` must address a reserved slot of this arena holding a value
    /// placed there by [`construct`](Self::construct) and not yet destroyed.
    #[allow(unsafe_code)]
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        debug_assert!(self.accepts(ptr), "destroy outside arena");
        // SAFETY: forwarded caller contract.
        unsafe { self.buffer.drop_in_place(ptr) };
    }

    /// Whether `ptr` is one this arena may hand out.
    fn accepts(&self, ptr: NonNull<T>) -> bool {
        !self.config.verify_foreign_pointers || self.contains(ptr)
    }

    fn heapify(&mut self) {
        for i in (0..self.available / 2).rev() {
            self.sift_down(i, self.available);
        }
    }

    /// Restore the heap property in `[0, len)` below position `i`.
    fn sift_down(&mut self, mut i: usize, len: usize) {
        loop {
            let left = 2 * i + 1;
            if left >= len {
                return;
            }
            let right = left + 1;
            let child = if right < len && self.entries[right].state > self.entries[left].state {
                right
            } else {
                left
            };
            if self.entries[child].state <= self.entries[i].state {
                return;
            }
            self.entries.swap(i, child);
            i = child;
        }
    }

    /// Restore the heap property above position `i`.
    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[parent].state >= self.entries[i].state {
                return;
            }
            self.entries.swap(parent, i);
            i = parent;
        }
    }

    /// Whether the bookkeeping table satisfies its invariants: a valid
    /// max-heap in `[0, available)` and only cleared taken entries after it.
    pub fn is_heap(&self) -> bool {
        let heap = &self.entries[..self.available];
        let ordered = (1..heap.len()).all(|i| heap[(i - 1) / 2].state >= heap[i].state);
        let tail_taken = self.entries[self.available..]
            .iter()
            .all(|e| e.state.is_taken() && e.ptr.is_none());
        ordered && tail_taken
    }

    /// Heap boundary: the number of free slots.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Number of slots; always `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Same as [`capacity`](Self::capacity).
    pub const fn max_size(&self) -> usize {
        N
    }

    /// Slot addressed by `ptr`, if it points at one of this arena's slots.
    pub fn slot_index(&self, ptr: NonNull<T>) -> Option<SlotIndex> {
        self.buffer.index_of(ptr).map(SlotIndex)
    }

    /// Whether `ptr` points at one of this arena's slots.
    pub fn contains(&self, ptr: NonNull<T>) -> bool {
        self.buffer.index_of(ptr).is_some()
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

impl<T, const N: usize> PoolAllocator<T> for HeapArena<T, N> {
    fn allocate(&mut self, count: usize) -> Result<NonNull<T>, PoolError> {
        if count != 1 {
            return Err(PoolError::UnsupportedCount { requested: count });
        }
        HeapArena::allocate(self)
    }

    fn deallocate(&mut self, ptr: NonNull<T>, count: usize) {
        if count != 1 {
            self.stats.record_ignored();
            warn!(
                arena = self.config.label,
                count, "ignoring multi-slot release on a single-slot arena"
            );
            return;
        }
        HeapArena::deallocate(self, ptr.as_ptr());
    }

    #[allow(unsafe_code)]
    unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: forwarded caller contract.
        unsafe { HeapArena::construct(self, ptr, value) };
    }

    #[allow(unsafe_code)]
    unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: forwarded caller contract.
        unsafe { HeapArena::destroy(self, ptr) };
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
impl<T, const N: usize> PartialEq for HeapArena<T, N> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T, const N: usize> Eq for HeapArena<T, N> {}

impl<T, const N: usize> fmt::Debug for HeapArena<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapArena")
            .field("label", &self.config.label)
            .field("capacity", &N)
            .field("available", &self.available)
            .finish_non_exhaustive()
    }
}

// SAFETY: the entry pointers only ever address this arena's own buffer
// (or, with verification off, memory the caller vouched for); the arena
// owns that buffer outright, so moving it across threads is sound when
// T: Send. The arena is never Sync.
#[allow(unsafe_code)]
unsafe impl<T: Send, const N: usize> Send for HeapArena<T, N> {}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use fixpool_test_utils::DropTally;
    use std::collections::HashSet;

    #[test]
    fn starts_full_and_heapified() {
        let arena = HeapArena::<i32, 16>::new().unwrap();
        assert_eq!(arena.available(), 16);
        assert!(arena.is_heap());
    }

    #[test]
    fn exactly_capacity_allocations_then_explicit_error() {
        let mut arena = HeapArena::<i32, 8>::new().unwrap();
        let mut seen = HashSet::new();
        for _ in 0..8 {
            let p = arena.allocate().unwrap();
            assert!(arena.contains(p));
            assert!(seen.insert(p));
            assert!(arena.is_heap());
        }
        assert_eq!(arena.available(), 0);
        assert_eq!(
            arena.allocate(),
            Err(PoolError::Exhausted {
                requested: 1,
                capacity: 8
            })
        );
        assert_eq!(arena.stats().failed_allocations, 1);
    }

    #[test]
    fn release_one_when_full_then_reallocate_it() {
        let mut arena = HeapArena::<i32, 4>::new().unwrap();
        let ptrs: Vec<_> = (0..4).map(|_| arena.allocate().unwrap()).collect();
        arena.deallocate(ptrs[2].as_ptr());
        assert_eq!(arena.available(), 1);
        assert!(arena.is_heap());

        let again = arena.allocate().unwrap();
        assert_eq!(again, ptrs[2]);
        assert!(arena.contains(again));
        assert_eq!(arena.available(), 0);
    }

    #[test]
    fn null_release_is_a_no_op() {
        let mut arena = HeapArena::<i32, 4>::new().unwrap();
        arena.allocate().unwrap();
        let before = arena.stats();
        arena.deallocate(std::ptr::null_mut());
        assert_eq!(arena.available(), 3);
        assert_eq!(arena.stats(), before);
        assert!(arena.is_heap());
    }

    #[test]
    fn release_into_full_free_heap_is_a_no_op() {
        let mut arena = HeapArena::<i32, 4>::new().unwrap();
        let p = arena.allocate().unwrap();
        arena.deallocate(p.as_ptr());
        assert_eq!(arena.available(), 4);

        let before = arena.stats();
        let slot = arena.buffer.slot_ptr(1);
        arena.deallocate(slot.as_ptr());
        assert_eq!(arena.available(), 4);
        assert_eq!(arena.stats(), before);
        assert!(arena.is_heap());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "slot released twice")]
    fn double_release_is_caught_in_debug_builds() {
        let mut arena = HeapArena::<i32, 4>::new().unwrap();
        let p = arena.allocate().unwrap();
        arena.allocate().unwrap();
        arena.deallocate(p.as_ptr());
        arena.deallocate(p.as_ptr());
    }

    #[test]
    fn foreign_pointer_is_rejected_when_verifying() {
        let mut arena = HeapArena::<i32, 2>::new().unwrap();
        arena.allocate().unwrap();
        let mut outside = 0;
        arena.deallocate(&mut outside);
        assert_eq!(arena.available(), 1);
        assert_eq!(arena.stats().ignored_deallocations, 1);
    }

    #[test]
    fn foreign_pointer_is_trusted_in_production_mode() {
        let mut arena = HeapArena::<i32, 2>::with_config(ArenaConfig::production()).unwrap();
        arena.allocate().unwrap();
        let mut outside = 0;
        arena.deallocate(&mut outside);
        assert_eq!(arena.available(), 2);
        arena.allocate().unwrap();
        assert_eq!(arena.available(), 1);
        assert!(arena.is_heap());
    }

    #[test]
    fn trusted_foreign_slot_can_hold_a_value() {
        let mut arena = HeapArena::<i32, 1>::with_config(ArenaConfig::production()).unwrap();
        let own = arena.allocate().unwrap();
        let mut outside = 0;
        arena.deallocate(&mut outside);
        let handed_back = arena.allocate().unwrap();
        assert!(!arena.contains(handed_back));

        unsafe {
            arena.construct(handed_back, 17);
            arena.destroy(handed_back);
        }
        assert_eq!(outside, 17);
        arena.deallocate(own.as_ptr());
    }

    #[test]
    fn pop_order_drains_every_slot_once() {
        let mut arena = HeapArena::<u8, 33>::new().unwrap();
        let mut indices: Vec<_> = (0..33)
            .map(|_| {
                let p = arena.allocate().unwrap();
                arena.slot_index(p).unwrap().0
            })
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..33).collect::<Vec<_>>());
    }

    #[test]
    fn construct_and_destroy_leave_bookkeeping_alone() {
        let tally = DropTally::new();
        let mut arena = HeapArena::<_, 2>::new().unwrap();
        let p = arena.allocate().unwrap();
        unsafe { arena.construct(p, tally.token(9)) };
        assert_eq!(unsafe { p.as_ref() }.value(), 9);
        assert_eq!(arena.available(), 1);

        unsafe { arena.destroy(p) };
        assert_eq!(tally.dropped(), 1);
        assert_eq!(arena.available(), 1);
        arena.deallocate(p.as_ptr());
        assert_eq!(arena.available(), 2);
    }

    #[test]
    fn contract_rejects_multi_slot_requests() {
        let mut arena = HeapArena::<i32, 4>::new().unwrap();
        assert_eq!(
            PoolAllocator::allocate(&mut arena, 2),
            Err(PoolError::UnsupportedCount { requested: 2 })
        );
        assert_eq!(
            PoolAllocator::allocate(&mut arena, 0),
            Err(PoolError::UnsupportedCount { requested: 0 })
        );
        let p = PoolAllocator::allocate(&mut arena, 1).unwrap();
        PoolAllocator::deallocate(&mut arena, p, 3);
        assert_eq!(arena.available(), 3);
        PoolAllocator::deallocate(&mut arena, p, 1);
        assert_eq!(arena.available(), 4);
    }

    #[test]
    fn zero_capacity_arena_reports_exhaustion() {
        let mut arena = HeapArena::<i32, 0>::new().unwrap();
        assert!(arena.is_heap());
        assert!(arena.allocate().unwrap_err().is_exhausted());
    }

    #[test]
    fn debug_patterns_mark_slots() {
        let mut arena = HeapArena::<u16, 1>::with_config(ArenaConfig::debug()).unwrap();
        let p = arena.allocate().unwrap();
        assert_eq!(unsafe { p.as_ptr().read() }, 0xBBBB);
        arena.deallocate(p.as_ptr());
        assert_eq!(unsafe { p.as_ptr().read() }, 0xDDDD);
    }

    #[test]
    fn arenas_of_same_type_compare_equal() {
        let mut a = HeapArena::<i32, 4>::new().unwrap();
        a.allocate().unwrap();
        assert_eq!(a, HeapArena::<i32, 4>::new().unwrap());
        assert_eq!(PoolAllocator::fresh(&a).unwrap().available(), 4);
    }

    #[test]
    fn sift_restores_order_over_mixed_states() {
        let mut arena = HeapArena::<u32, 7>::new().unwrap();
        for i in [0, 2, 5] {
            arena.entries[i] = HeapEntry::taken();
        }
        arena.heapify();
        assert!(arena.is_heap());
        assert!(arena.entries[0].state.is_free());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn heap_invariant_holds_across_any_sequence(
                ops in proptest::collection::vec(any::<(bool, u8)>(), 1..128),
            ) {
                let mut arena = HeapArena::<u64, 20>::new().unwrap();
                let mut live: Vec<NonNull<u64>> = Vec::new();
                for (release, pick) in ops {
                    if release && !live.is_empty() {
                        let p = live.swap_remove(pick as usize % live.len());
                        arena.deallocate(p.as_ptr());
                    } else {
                        match arena.allocate() {
                            Ok(p) => {
                                prop_assert!(arena.contains(p));
                                prop_assert!(!live.contains(&p));
                                live.push(p);
                            }
                            Err(err) => {
                                prop_assert!(err.is_exhausted());
                                prop_assert_eq!(live.len(), 20);
                            }
                        }
                    }
                    prop_assert!(arena.is_heap());
                    prop_assert_eq!(arena.available(), 20 - live.len());
                    prop_assert_eq!(arena.stats().in_use, live.len());
                }
            }
        }
    }
}
