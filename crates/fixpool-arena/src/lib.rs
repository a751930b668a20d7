//! Fixed-capacity slot arenas for fixpool.
//!
//! Two allocation strategies over a statically sized backing buffer of
//! `N` slots of `T`. Each arena reserves its buffer once at construction
//! and never calls the system allocator again.
//!
//! # Architecture
//!
//! ```text
//! SlotArena<T, N> (contiguous, first-fit, O(N))
//! ├── BackingBuffer<T> (N uninitialised slots, heap-pinned)
//! └── occupancy table: [SlotState; N], index-aligned with the slots
//!
//! HeapArena<T, N> (single slot, O(log N))
//! ├── BackingBuffer<T>
//! └── bookkeeping: max-heap of (state, ptr) in [0, available),
//!     taken entries in [available, N)
//! ```
//!
//! Both implement [`PoolAllocator`](fixpool_core::PoolAllocator), the
//! contract a container uses to acquire storage, construct values in it,
//! destroy them, and release the storage again.
//!
//! # Threading
//!
//! Arenas are single-threaded: there is no internal locking and every
//! mutating call takes `&mut self`. They are `Send` when `T` is, never
//! `Sync`. Share one behind a mutex, or give each thread its own.
//!
//! # Safety
//!
//! All raw memory handling lives in the private `raw` module. The only
//! `unsafe` entry points in the public API are `construct` and `destroy`,
//! whose contracts mirror `ptr::write` and `ptr::drop_in_place`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod heap_arena;
mod raw;
pub mod slot_arena;

// Public re-exports for the primary API surface.
pub use config::ArenaConfig;
pub use heap_arena::HeapArena;
pub use slot_arena::SlotArena;
