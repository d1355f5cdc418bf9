//! Navigation transitions over a [`SpreadPlanner`].

use crate::pairing::SpreadPlanner;
use folio_pdf_engine::PageSource;
use folio_viewer_core::{
    backward_candidate, forward_candidate, resolve_candidate, NavigationState, PageStep,
};

impl<D: PageSource + 'static> SpreadPlanner<'_, D> {
    /// State shown right after a document loads.
    pub async fn initial(&self) -> NavigationState {
        NavigationState::new(0, self.can_pair(0).await)
    }

    /// Re-derives pairing for the current page without moving.
    pub async fn reevaluate(&self, state: NavigationState) -> NavigationState {
        let pair = self.can_pair(i64::from(state.page_index)).await;
        NavigationState::new(state.page_index, pair)
    }

    /// Moves one step and re-derives pairing for the landing page.
    ///
    /// Forward moves skip the right page of a spread. Backward moves land one
    /// page earlier, or two when the page before that starts a spread. A move
    /// past the last page leaves the index unchanged.
    pub async fn step(&self, state: NavigationState, step: PageStep) -> NavigationState {
        let candidate = match step {
            PageStep::Forward => forward_candidate(state),
            PageStep::Backward => {
                let candidate = backward_candidate(state);
                if self.can_pair(candidate - 1).await {
                    candidate - 1
                } else {
                    candidate
                }
            }
        };

        let page_count = self.document.page_count();
        let page_index = resolve_candidate(candidate, state.page_index, page_count);
        let pair = self.can_pair(i64::from(page_index)).await;

        tracing::debug!(
            ?step,
            from = state.page_index,
            candidate,
            to = page_index,
            pair,
            "navigation step"
        );
        NavigationState::new(page_index, pair)
    }
}
