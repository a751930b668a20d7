//! A growable sequence backed by any [`PoolAllocator`].

#![allow(unsafe_code)]

use std::ptr::NonNull;

use fixpool_core::{PoolAllocator, PoolError};

/// Minimal vector over a pool allocator.
///
/// Grows by doubling: each growth allocates a new block, moves the
/// elements across and releases the old block. Growth that the arena
/// cannot satisfy is returned as the arena's error and leaves the
/// sequence untouched.
pub struct FixedSeq<T, A: PoolAllocator<T>> {
    alloc: A,
    ptr: Option<NonNull<T>>,
    len: usize,
    cap: usize,
}

impl<T, A: PoolAllocator<T>> FixedSeq<T, A> {
    /// An empty sequence; nothing is allocated until the first push.
    pub fn new(alloc: A) -> Self {
        Self {
            alloc,
            ptr: None,
            len: 0,
            cap: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Append `value`, growing the block first if it is full.
    pub fn push(&mut self, value: T) -> Result<(), PoolError> {
        if self.len == self.cap {
            self.grow()?;
        }
        let base = self.ptr.expect("capacity > 0 after grow");
        // SAFETY: len < cap, so the slot is inside the reserved block and
        // holds no live value.
        unsafe { self.alloc.construct(base.add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let base = self.ptr?;
        // SAFETY: the slot at the old last index holds a live value, and
        // len was decremented so it is no longer considered live.
        Some(unsafe { base.add(self.len).read() })
    }

    /// Remove the element at `index`, shifting the tail left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "index {index} out of bounds ({})", self.len);
        let base = self.ptr.expect("non-empty sequence has a block");
        // SAFETY: index < len, so both the read and the overlapping copy of
        // the tail stay within the live prefix of the block.
        unsafe {
            let out = base.add(index).read();
            std::ptr::copy(
                base.add(index + 1).as_ptr(),
                base.add(index).as_ptr(),
                self.len - index - 1,
            );
            self.len -= 1;
            out
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            // SAFETY: the first len slots hold live values.
            Some(base) => unsafe { std::slice::from_raw_parts(base.as_ptr(), self.len) },
            None => &[],
        }
    }

    /// Destroy every element through the allocator, keeping the block.
    pub fn clear(&mut self) {
        if let Some(base) = self.ptr {
            for i in 0..self.len {
                // SAFETY: slot i < len holds a live value.
                unsafe { self.alloc.destroy(base.add(i)) };
            }
        }
        self.len = 0;
    }

    /// Copy the elements into a new sequence over a fresh arena.
    pub fn try_clone(&self) -> Result<Self, PoolError>
    where
        T: Clone,
    {
        let mut out = Self::new(self.alloc.fresh()?);
        for value in self.as_slice() {
            out.push(value.clone())?;
        }
        Ok(out)
    }

    fn grow(&mut self) -> Result<(), PoolError> {
        let new_cap = if self.cap == 0 { 1 } else { self.cap * 2 };
        let fresh = self.alloc.allocate(new_cap)?;
        if let Some(old) = self.ptr {
            // SAFETY: both blocks are reserved and distinct; the first len
            // slots of `old` are live and are moved bitwise into `fresh`.
            unsafe { std::ptr::copy_nonoverlapping(old.as_ptr(), fresh.as_ptr(), self.len) };
            self.alloc.deallocate(old, self.cap);
        }
        self.ptr = Some(fresh);
        self.cap = new_cap;
        Ok(())
    }
}

impl<T, A: PoolAllocator<T>> Drop for FixedSeq<T, A> {
    fn drop(&mut self) {
        self.clear();
        if let Some(base) = self.ptr.take() {
            self.alloc.deallocate(base, self.cap);
        }
    }
}

impl<T: std::fmt::Debug, A: PoolAllocator<T>> std::fmt::Debug for FixedSeq<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
