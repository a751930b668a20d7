//! Values that report their own lifecycle.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
struct Counts {
    created: Cell<usize>,
    dropped: Cell<usize>,
}

/// Shared counter of [`Tracked`] values created and dropped.
///
/// ```
/// use fixpool_test_utils::DropTally;
///
/// let tally = DropTally::new();
/// let a = tally.token(1);
/// assert_eq!(tally.live(), 1);
/// drop(a);
/// assert_eq!(tally.dropped(), 1);
/// ```
#[derive(Clone, Default)]
pub struct DropTally {
    counts: Rc<Counts>,
}

impl DropTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracked value carrying `value`.
    pub fn token(&self, value: i32) -> Tracked {
        self.counts.created.set(self.counts.created.get() + 1);
        Tracked {
            value,
            counts: Rc::clone(&self.counts),
        }
    }

    /// Number of tracked values created so far, clones included.
    pub fn created(&self) -> usize {
        self.counts.created.get()
    }

    /// Number of tracked values dropped so far.
    pub fn dropped(&self) -> usize {
        self.counts.dropped.get()
    }

    /// Tracked values created but not yet dropped.
    pub fn live(&self) -> usize {
        self.created() - self.dropped()
    }
}

/// A value whose drop is recorded in the [`DropTally`] that made it.
pub struct Tracked {
    value: i32,
    counts: Rc<Counts>,
}

impl Tracked {
    pub fn value(&self) -> i32 {
        self.value
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.counts.created.set(self.counts.created.get() + 1);
        Self {
            value: self.value,
            counts: Rc::clone(&self.counts),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counts.dropped.set(self.counts.dropped.get() + 1);
    }
}

impl std::fmt::Debug for Tracked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Tracked").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_count_as_created() {
        let tally = DropTally::new();
        let a = tally.token(3);
        let b = a.clone();
        assert_eq!(tally.created(), 2);
        assert_eq!(b.value(), 3);
        drop(a);
        drop(b);
        assert_eq!(tally.live(), 0);
    }
}
