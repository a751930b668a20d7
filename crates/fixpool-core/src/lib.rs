//! Core types and traits for the fixpool allocator family.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every arena strategy and by the containers
//! that consume them: slot identifiers, occupancy states, error types,
//! statistics snapshots, and the [`PoolAllocator`] contract.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod id;
pub mod stats;
pub mod traits;

pub use error::PoolError;
pub use id::{SlotIndex, SlotState};
pub use stats::ArenaStats;
pub use traits::PoolAllocator;
