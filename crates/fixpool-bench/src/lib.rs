//! Benchmark workloads for the fixpool arenas.
//!
//! - [`churn_plan`]: deterministic allocate/release sequence via seed
//! - [`run_slot_churn`] / [`run_heap_churn`]: replay a plan against an arena
//! - [`fragment`]: leave a [`SlotArena`] with every other slot taken

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ptr::NonNull;

use fixpool_arena::{HeapArena, SlotArena};
use fixpool_core::ArenaStats;

/// One step of a churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Reserve a run of this many slots.
    Alloc(usize),
    /// Release the outstanding allocation at this position in the live list
    /// (taken modulo its length).
    Release(usize),
}

/// Generate a deterministic churn plan of `len` steps.
///
/// Roughly two allocations per release; run lengths are in
/// `1..=max_run`.
pub fn churn_plan(len: usize, max_run: usize, seed: u64) -> Vec<ChurnOp> {
    let max_run = max_run.max(1);
    let mut state = seed;
    let mut plan = Vec::with_capacity(len);
    for _ in 0..len {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let roll = (state >> 33) as usize;
        if roll % 3 == 0 {
            plan.push(ChurnOp::Release(roll / 3));
        } else {
            plan.push(ChurnOp::Alloc(1 + (roll / 3) % max_run));
        }
    }
    plan
}

/// Replay `plan` against a slot arena and return its counters afterwards.
///
/// Whatever is still outstanding at the end is released.
pub fn run_slot_churn<T, const N: usize>(
    arena: &mut SlotArena<T, N>,
    plan: &[ChurnOp],
) -> ArenaStats {
    let mut live: Vec<(NonNull<T>, usize)> = Vec::new();
    for op in plan {
        match *op {
            ChurnOp::Alloc(n) => {
                if let Some(p) = arena.allocate(n) {
                    live.push((p, n));
                }
            }
            ChurnOp::Release(k) if !live.is_empty() => {
                let (p, n) = live.swap_remove(k % live.len());
                arena.deallocate(p, n);
            }
            ChurnOp::Release(_) => {}
        }
    }
    for (p, n) in live {
        arena.deallocate(p, n);
    }
    arena.stats()
}

/// Replay `plan` against a heap arena, treating every run length as one
/// slot. Returns the arena's counters afterwards.
pub fn run_heap_churn<T, const N: usize>(
    arena: &mut HeapArena<T, N>,
    plan: &[ChurnOp],
) -> ArenaStats {
    let mut live: Vec<NonNull<T>> = Vec::new();
    for op in plan {
        match *op {
            ChurnOp::Alloc(_) => {
                if let Ok(p) = arena.allocate() {
                    live.push(p);
                }
            }
            ChurnOp::Release(k) if !live.is_empty() => {
                let p = live.swap_remove(k % live.len());
                arena.deallocate(p.as_ptr());
            }
            ChurnOp::Release(_) => {}
        }
    }
    for p in live {
        arena.deallocate(p.as_ptr());
    }
    arena.stats()
}

/// Fill the arena one slot at a time, then release every odd slot.
///
/// Leaves `N / 2` free slots, none of them adjacent, so any request for
/// two or more slots has to scan the whole table and fail.
pub fn fragment<T, const N: usize>(arena: &mut SlotArena<T, N>) -> Vec<NonNull<T>> {
    let mut taken = Vec::with_capacity(N);
    while let Some(p) = arena.allocate(1) {
        taken.push(p);
    }
    let mut kept = Vec::with_capacity(N.div_ceil(2));
    for (i, p) in taken.into_iter().enumerate() {
        if i % 2 == 1 {
            arena.deallocate(p, 1);
        } else {
            kept.push(p);
        }
    }
    kept
}
