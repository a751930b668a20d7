//! The allocator contract consumed by container collaborators.

use std::ptr::NonNull;

use crate::error::PoolError;
use crate::stats::ArenaStats;

/// Raw allocate / construct / destroy / deallocate contract.
///
/// Implemented by every arena strategy. A container drives it the same
/// way regardless of strategy:
///
/// ```text
/// allocate(n) → construct(p + i, v) … → destroy(p + i) … → deallocate(p, n)
/// ```
///
/// Storage acquisition and value initialisation are separate steps. An
/// arena never runs `T`'s constructor or destructor on its own, only on
/// an explicit [`construct`](PoolAllocator::construct) or
/// [`destroy`](PoolAllocator::destroy).
///
/// Equality compares type and capacity only: two arenas of the same type
/// are interchangeable allocators even when their occupancy differs.
/// Arenas are never duplicated; [`fresh`](PoolAllocator::fresh) creates a
/// new empty arena of the same kind instead.
#[allow(unsafe_code)]
pub trait PoolAllocator<T>: PartialEq + Sized {
    /// Reserve `count` contiguous slots and return a pointer to the first.
    ///
    /// Running out of space is reported as [`PoolError::Exhausted`]; it is
    /// a normal outcome the caller must handle.
    fn allocate(&mut self, count: usize) -> Result<NonNull<T>, PoolError>;

    /// Release `count` slots starting at `ptr`.
    ///
    /// `ptr` and `count` must match an earlier successful
    /// [`allocate`](PoolAllocator::allocate). Arenas ignore pointers they
    /// can tell are not theirs, but cannot detect every misuse.
    fn deallocate(&mut self, ptr: NonNull<T>, count: usize);

    /// Move `value` into the slot at `ptr` without reading the old contents.
    ///
    /// # Safety
    ///
    /// `ptr` must address a slot of this arena reserved by an outstanding
    /// allocation. A value already living there is overwritten without
    /// being dropped.
    unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: ptr is valid for writes and aligned per caller contract.
        unsafe { ptr.as_ptr().write(value) };
    }

    /// Drop the value living at `ptr` in place, leaving the slot reserved.
    ///
    /// # Safety
    ///
    /// `ptr` must address a reserved slot holding a value previously
    /// placed there by [`construct`](PoolAllocator::construct) and not yet
    /// destroyed.
    unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: ptr holds an initialised T per caller contract.
        unsafe { std::ptr::drop_in_place(ptr.as_ptr()) };
    }

    /// Total number of slots; never changes after construction.
    fn max_size(&self) -> usize;

    /// Create a new, empty arena of the same kind and capacity.
    fn fresh(&self) -> Result<Self, PoolError>;

    /// Snapshot of the arena's usage counters.
    fn stats(&self) -> ArenaStats;
}
