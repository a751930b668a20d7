//! fixpool: fixed-capacity pool allocators.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the fixpool sub-crates. For most users, adding `fixpool` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use fixpool::prelude::*;
//!
//! let mut arena = SlotArena::<i32, 16>::new().unwrap();
//! let run = arena.allocate(4).unwrap();
//! for i in 0..4 {
//!     // SAFETY: the four slots were just reserved and are empty.
//!     unsafe { arena.construct(run.add(i), i as i32) };
//! }
//! assert_eq!(arena.free_count(), 12);
//!
//! for i in 0..4 {
//!     // SAFETY: each slot holds the value constructed above.
//!     unsafe { arena.destroy(run.add(i)) };
//! }
//! arena.deallocate(run, 4);
//! assert_eq!(arena.free_count(), 16);
//!
//! let mut heap = HeapArena::<i32, 4>::new().unwrap();
//! let slot = heap.allocate().unwrap();
//! heap.deallocate(slot.as_ptr());
//! assert_eq!(heap.available(), 4);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `fixpool-arena` | `SlotArena`, `HeapArena`, `ArenaConfig` |
//! | [`types`] | `fixpool-core` | `PoolAllocator`, `PoolError`, `ArenaStats`, slot IDs |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena strategies and their configuration (`fixpool-arena`).
///
/// [`arena::SlotArena`] serves contiguous runs first-fit;
/// [`arena::HeapArena`] serves single slots from a max-heap.
pub use fixpool_arena as arena;

/// Core types and the allocator contract (`fixpool-core`).
pub use fixpool_core as types;

/// Common imports for typical fixpool usage.
///
/// ```rust
/// use fixpool::prelude::*;
/// ```
pub mod prelude {
    pub use fixpool_arena::{ArenaConfig, HeapArena, SlotArena};
    pub use fixpool_core::{ArenaStats, PoolAllocator, PoolError, SlotIndex, SlotState};
}
