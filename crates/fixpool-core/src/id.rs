//! Slot identifiers and the two-valued occupancy state.

use std::cmp::Ordering;
use std::fmt;

/// Position of a slot inside an arena's backing buffer.
///
/// Slot indices are dense: an arena of capacity `N` owns exactly the
/// indices `0..N`, and `SlotIndex(i)` always refers to the same storage
/// address for the arena's whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub usize);

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SlotIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Occupancy of a single slot.
///
/// The ordering is `Free > Taken`. Heap-based bookkeeping relies on it:
/// under a max-heap, free entries float to the root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// The slot holds no live element and may be handed out.
    #[default]
    Free,
    /// The slot is reserved by an outstanding allocation.
    Taken,
}

impl SlotState {
    /// Whether the slot may be handed out.
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    /// Whether the slot is reserved.
    pub fn is_taken(self) -> bool {
        matches!(self, Self::Taken)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Free => 1,
            Self::Taken => 0,
        }
    }
}

impl PartialOrd for SlotState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SlotState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Taken => write!(f, "taken"),
        }
    }
}
