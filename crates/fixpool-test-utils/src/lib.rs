//! Test fixtures for fixpool development.
//!
//! - [`DropTally`] hands out [`Tracked`] values that count their own
//!   drops, for asserting that arenas never construct or destroy values
//!   behind the caller's back.
//! - [`FixedSeq`] is a minimal growable sequence that drives any
//!   [`PoolAllocator`](fixpool_core::PoolAllocator) through the full
//!   allocate / construct / destroy / deallocate contract.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod seq;

pub use fixtures::{DropTally, Tracked};
pub use seq::FixedSeq;
