//! Error types shared by every arena strategy.
//!
//! Capacity exhaustion is an expected, recoverable outcome: callers match
//! on [`PoolError::Exhausted`] and decide whether to retry, fall back, or
//! propagate. Construction errors are reported once, up front, by the
//! fallible arena constructors.

use thiserror::Error;

/// Errors that can occur while creating or using an arena.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No free run of the requested length exists.
    #[error("arena exhausted: requested {requested} slot(s), capacity {capacity}")]
    Exhausted {
        /// Number of contiguous slots requested.
        requested: usize,
        /// Total number of slots the arena owns.
        capacity: usize,
    },
    /// The arena cannot serve a request of this size at all.
    ///
    /// Returned by single-slot strategies for any count other than one.
    #[error("arena serves single-slot requests only, got {requested}")]
    UnsupportedCount {
        /// Number of slots requested.
        requested: usize,
    },
    /// Zero-sized element types have no distinct slot addresses.
    #[error("zero-sized element types cannot be pooled")]
    ZeroSizedElement,
    /// `capacity * element_size` does not fit in a valid allocation.
    #[error("backing buffer for {capacity} x {element_size} bytes overflows")]
    LayoutOverflow {
        /// Requested slot count.
        capacity: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
}

impl PoolError {
    /// Whether this error reports a full pool rather than a misuse.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
