//! Low-level primitives for arena memory operations.
//!
//! [`BackingBuffer`] is the only place in this crate that touches raw
//! memory. It owns uninitialised storage for exactly `len` values of `T`
//! and translates between slot indices and typed pointers. It never reads,
//! initialises, or drops a `T`; that is left to explicit construct/destroy
//! calls made by the arena's caller.
//!
//! The storage is acquired once through `Box` and held as a raw pointer
//! for the buffer's lifetime, so slot addresses stay stable when the
//! owning arena is moved and pointers handed to callers are never
//! invalidated by the arena taking `&mut self`.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};

use fixpool_core::PoolError;

/// Owned, fixed-length, uninitialised storage for `len` values of `T`.
pub(crate) struct BackingBuffer<T> {
    base: NonNull<MaybeUninit<T>>,
    len: usize,
}

impl<T> BackingBuffer<T> {
    /// Reserve storage for `len` elements.
    ///
    /// This is the only call that reaches the system allocator.
    pub(crate) fn new(len: usize) -> Result<Self, PoolError> {
        let element_size = mem::size_of::<T>();
        if element_size == 0 {
            return Err(PoolError::ZeroSizedElement);
        }
        Layout::array::<T>(len).map_err(|_| PoolError::LayoutOverflow {
            capacity: len,
            element_size,
        })?;

        let storage: Box<[MaybeUninit<T>]> = Box::new_uninit_slice(len);
        let raw = Box::into_raw(storage).cast::<MaybeUninit<T>>();
        // SAFETY: Box::into_raw never returns null.
        let base = unsafe { NonNull::new_unchecked(raw) };
        Ok(Self { base, len })
    }

    /// Number of slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Typed pointer to slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub(crate) fn slot_ptr(&self, index: usize) -> NonNull<T> {
        assert!(
            index < self.len,
            "slot index {index} out of range for buffer of {} slots",
            self.len
        );
        // SAFETY: index < len, so the offset stays inside the allocation.
        unsafe { self.base.add(index) }.cast::<T>()
    }

    /// Slot index addressed by `ptr`, if it points exactly at a slot start.
    pub(crate) fn index_of(&self, ptr: NonNull<T>) -> Option<usize> {
        let element_size = mem::size_of::<T>();
        let offset = (ptr.as_ptr() as usize).checked_sub(self.base.as_ptr() as usize)?;
        if offset % element_size != 0 {
            return None;
        }
        let index = offset / element_size;
        (index < self.len).then_some(index)
    }

    /// Overwrite every byte of slots `start..start + count` with `byte`.
    ///
    /// Used for debug fill patterns on slots that hold no live value.
    ///
    /// # Panics
    ///
    /// Panics if the range leaves the buffer.
    pub(crate) fn fill(&mut self, start: usize, count: usize, byte: u8) {
        let end = start.checked_add(count).filter(|&end| end <= self.len);
        assert!(end.is_some(), "fill range {start}+{count} out of bounds");
        if count == 0 {
            return;
        }
        // SAFETY: the range was checked against len above; the slots are
        // treated as plain bytes and hold no live T per caller contract.
        unsafe {
            ptr::write_bytes(self.slot_ptr(start).as_ptr(), byte, count);
        }
    }

    /// Move `value` into the slot at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be aligned and valid for writes of `T`. Membership in
    /// this buffer is the caller's check to make. Any value already there
    /// is overwritten without being dropped.
    pub(crate) unsafe fn write(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: ptr is aligned and valid for writes per caller contract.
        unsafe { ptr.as_ptr().write(value) };
    }

    /// Drop the value living at `ptr` in place.
    ///
    /// # Safety
    ///
    /// `ptr` must hold an initialised `T`.
    pub(crate) unsafe fn drop_in_place(&self, ptr: NonNull<T>) {
        // SAFETY: ptr holds a live T per caller contract.
        unsafe { ptr::drop_in_place(ptr.as_ptr()) };
    }
}

impl<T> Drop for BackingBuffer<T> {
    fn drop(&mut self) {
        let slice = ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.len);
        // SAFETY: base/len came from Box::into_raw in `new` and are released
        // exactly once. MaybeUninit<T> has no drop glue, so values still
        // living in slots are not dropped.
        drop(unsafe { Box::from_raw(slice) });
    }
}

// SAFETY: the buffer exclusively owns its storage; sending it sends the
// storage and any T values in it, which is sound when T: Send.
unsafe impl<T: Send> Send for BackingBuffer<T> {}
