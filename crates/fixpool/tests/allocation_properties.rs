//! Integration test: pointer validity and non-overlap under arbitrary
//! allocate/release sequences, driven through the shared contract.

use std::collections::BTreeMap;

use fixpool::prelude::*;
use proptest::prelude::*;

const CAP: usize = 32;

#[derive(Clone, Debug)]
enum Step {
    Alloc(usize),
    Release(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1usize..=4).prop_map(Step::Alloc),
        any::<usize>().prop_map(Step::Release),
    ]
}

/// Replay `steps` against any allocator, checking every outstanding run
/// stays inside the arena and no two runs share a slot.
fn replay<A: PoolAllocator<u64>>(
    arena: &mut A,
    steps: &[Step],
    index_of: impl Fn(&A, std::ptr::NonNull<u64>) -> Option<SlotIndex>,
) -> Result<(), TestCaseError> {
    // start slot -> (pointer, length)
    let mut live: BTreeMap<usize, (std::ptr::NonNull<u64>, usize)> = BTreeMap::new();
    for s in steps {
        match *s {
            Step::Alloc(n) => {
                if let Ok(p) = arena.allocate(n) {
                    let start = index_of(arena, p);
                    prop_assert!(start.is_some(), "pointer outside the arena");
                    let start = start.unwrap().0;
                    prop_assert!(start + n <= arena.max_size());
                    for (&other, &(_, len)) in &live {
                        prop_assert!(
                            start + n <= other || other + len <= start,
                            "run {start}+{n} overlaps {other}+{len}"
                        );
                    }
                    live.insert(start, (p, n));
                }
            }
            Step::Release(k) if !live.is_empty() => {
                let key = *live.keys().nth(k % live.len()).unwrap();
                let (p, n) = live.remove(&key).unwrap();
                arena.deallocate(p, n);
            }
            Step::Release(_) => {}
        }
        let held: usize = live.values().map(|&(_, n)| n).sum();
        prop_assert_eq!(arena.stats().in_use, held);
    }
    Ok(())
}

proptest! {
    #[test]
    fn slot_arena_runs_never_overlap(steps in prop::collection::vec(step(), 0..200)) {
        let mut arena = SlotArena::<u64, CAP>::new().unwrap();
        replay(&mut arena, &steps, |a, p| a.slot_index(p))?;
    }

    #[test]
    fn heap_arena_slots_never_overlap(steps in prop::collection::vec(step(), 0..200)) {
        let mut arena = HeapArena::<u64, CAP>::new().unwrap();
        // Multi-slot requests fail with UnsupportedCount and are skipped.
        replay(&mut arena, &steps, |a, p| a.slot_index(p))?;
        prop_assert!(arena.is_heap());
    }
}

#[test]
fn sixteen_int_scenario_reuses_first_hole() {
    let mut arena = SlotArena::<i32, 16>::new().unwrap();
    let slots: Vec<_> = (0..10).map(|_| arena.allocate(1).unwrap()).collect();
    arena.deallocate(slots[3], 1);
    arena.deallocate(slots[4], 1);

    let run = arena.allocate(2).unwrap();
    assert_eq!(run, slots[3]);
    assert_eq!(arena.slot_index(run), Some(SlotIndex(3)));
    assert_eq!(arena.free_count(), 6);
}

#[test]
fn exhaustion_is_reported_not_fatal() {
    let mut slot = SlotArena::<i32, 4>::new().unwrap();
    let mut heap = HeapArena::<i32, 4>::new().unwrap();
    for _ in 0..4 {
        PoolAllocator::allocate(&mut slot, 1).unwrap();
        PoolAllocator::allocate(&mut heap, 1).unwrap();
    }
    assert!(PoolAllocator::allocate(&mut slot, 1).unwrap_err().is_exhausted());
    assert!(PoolAllocator::allocate(&mut heap, 1).unwrap_err().is_exhausted());
    assert_eq!(slot.stats().failed_allocations, 1);
    assert_eq!(heap.stats().failed_allocations, 1);
}

#[test]
fn zero_sized_elements_are_rejected() {
    assert_eq!(
        SlotArena::<(), 8>::new().unwrap_err(),
        PoolError::ZeroSizedElement
    );
    assert_eq!(
        HeapArena::<(), 8>::new().unwrap_err(),
        PoolError::ZeroSizedElement
    );
}

#[test]
fn arenas_move_between_threads() {
    let arena = HeapArena::<u64, 8>::new().unwrap();
    let arena = std::thread::spawn(move || {
        let mut arena = arena;
        let p = arena.allocate().unwrap();
        arena.deallocate(p.as_ptr());
        arena
    })
    .join()
    .unwrap();
    assert_eq!(arena.available(), 8);
    assert_eq!(arena.stats().allocations, 1);
}
