//! Sequence tags for "last initiated wins" ordering.

use std::cell::Cell;

/// Tag handed out when an operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Monotonic counter of started operations of one kind.
///
/// An operation takes a [`Generation`] with [`GenerationCounter::advance`]
/// before its first suspension point and checks
/// [`GenerationCounter::is_current`] after each one. A newer operation
/// advancing the counter makes every older tag stale.
///
/// ```
/// use folio_scheduler::GenerationCounter;
///
/// let counter = GenerationCounter::new();
/// let first = counter.advance();
/// let second = counter.advance();
///
/// assert!(!counter.is_current(first));
/// assert!(counter.is_current(second));
/// ```
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: Cell<u64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> Generation {
        let next = self.current.get() + 1;
        self.current.set(next);
        Generation(next)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.get())
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current.get() == generation.0
    }
}
