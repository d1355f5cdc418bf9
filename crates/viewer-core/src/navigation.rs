//! Page-index arithmetic for spread navigation.
//!
//! Moves are computed in two phases. The first phase picks a candidate index
//! from the current [`NavigationState`]; backward moves also need one pairing
//! answer from the document, which the caller supplies. The second phase
//! clamps the candidate against the page count. Pairing for the landing page
//! is re-derived afterwards by the caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageStep {
    Forward,
    Backward,
}

/// Index of the left page on screen and whether its right neighbour is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationState {
    pub page_index: u32,
    pub pair_with_next: bool,
}

impl NavigationState {
    pub fn new(page_index: u32, pair_with_next: bool) -> Self {
        Self {
            page_index,
            pair_with_next,
        }
    }

    /// Index of the right-hand page, when a spread is shown.
    pub fn right_page(&self) -> Option<u32> {
        self.pair_with_next.then(|| self.page_index + 1)
    }

    /// Number of pages on screen.
    pub fn visible_pages(&self) -> u32 {
        if self.pair_with_next {
            2
        } else {
            1
        }
    }

    /// Whether the state satisfies the bounds invariant for `page_count`.
    pub fn is_valid_for(&self, page_count: u32) -> bool {
        if self.page_index >= page_count {
            return false;
        }
        !self.pair_with_next || self.page_index + 1 < page_count
    }
}

/// Index-only rules that rule out pairing before any geometry is fetched.
///
/// A page cannot start a spread when it is negative, when it is the last page
/// (or beyond), or when it is the first page and the document wants its
/// cover shown alone.
pub fn may_pair(page_index: i64, page_count: u32, first_page_alone: bool) -> bool {
    if page_index < 0 {
        return false;
    }
    if page_index >= i64::from(page_count) - 1 {
        return false;
    }
    !(first_page_alone && page_index == 0)
}

/// Candidate after a forward move: skip past the right page of a spread.
pub fn forward_candidate(state: NavigationState) -> i64 {
    i64::from(state.page_index) + 1 + i64::from(state.pair_with_next)
}

/// First candidate of a backward move.
///
/// Pairing is only ever decided looking forward from a left page, so the
/// caller then asks whether `candidate - 1` starts a spread and, if it does,
/// steps back one more page to show that spread whole.
pub fn backward_candidate(state: NavigationState) -> i64 {
    i64::from(state.page_index) - 1
}

/// Clamps a candidate to the document.
///
/// Negative candidates snap to the first page. Candidates past the last page
/// leave the viewer where it was.
pub fn resolve_candidate(candidate: i64, current: u32, page_count: u32) -> u32 {
    if candidate < 0 {
        return 0;
    }
    if candidate >= i64::from(page_count) {
        return current;
    }
    // candidate is in [0, page_count) so it fits in u32
    candidate as u32
}
