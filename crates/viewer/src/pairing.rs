//! Deciding whether a page and its successor form a spread.

use crate::document::BookDocument;
use folio_pdf_engine::{PageError, PageSource};
use folio_viewer_core::{left_page_fits, may_pair, spread_fits, ViewportSize};

/// Pairing and navigation decisions for one document in one viewport.
pub struct SpreadPlanner<'a, D> {
    pub(crate) document: &'a BookDocument<D>,
    pub(crate) viewport: ViewportSize,
    pub(crate) first_page_alone: bool,
}

impl<'a, D: PageSource + 'static> SpreadPlanner<'a, D> {
    pub fn new(
        document: &'a BookDocument<D>,
        viewport: ViewportSize,
        first_page_alone: bool,
    ) -> Self {
        Self {
            document,
            viewport,
            first_page_alone,
        }
    }

    /// Whether `page` can be shown as the left half of a spread.
    ///
    /// Geometry of the right page is only fetched once the left page is known
    /// to fit at height scale. Fetch failures are returned to the caller.
    pub async fn try_can_pair(&self, page: i64) -> Result<bool, PageError> {
        if !may_pair(page, self.document.page_count(), self.first_page_alone) {
            return Ok(false);
        }
        let Ok(left_index) = u32::try_from(page) else {
            return Ok(false);
        };

        let left = self.document.geometry(left_index).await?;
        if !left_page_fits(self.viewport, left) {
            return Ok(false);
        }

        let right = self.document.geometry(left_index + 1).await?;
        Ok(spread_fits(self.viewport, left, right))
    }

    /// [`Self::try_can_pair`] with failures degraded to a single page.
    pub async fn can_pair(&self, page: i64) -> bool {
        match self.try_can_pair(page).await {
            Ok(pair) => {
                tracing::trace!(page, pair, "pairing decided");
                pair
            }
            Err(error) => {
                tracing::warn!(page, %error, "pairing check failed, showing a single page");
                false
            }
        }
    }
}
