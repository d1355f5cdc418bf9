use async_trait::async_trait;
use folio_pdf_engine::{PageError, PageSource, RenderRequest, RgbaImage};
use folio_scheduler::CancellationToken;
use folio_viewer_core::PageGeometry;
use std::cell::Cell;

/// In-memory pages with fixed sizes. Never suspends.
pub(crate) struct FixedPages {
    pages: Vec<PageGeometry>,
    failing: Option<u32>,
    geometry_calls: Cell<u32>,
}

impl FixedPages {
    pub(crate) fn uniform(count: u32, geometry: PageGeometry) -> Self {
        Self::from_sizes(vec![geometry; count as usize])
    }

    pub(crate) fn from_sizes(pages: Vec<PageGeometry>) -> Self {
        Self {
            pages,
            failing: None,
            geometry_calls: Cell::new(0),
        }
    }

    pub(crate) fn failing_on(mut self, page: u32) -> Self {
        self.failing = Some(page);
        self
    }

    pub(crate) fn geometry_calls(&self) -> u32 {
        self.geometry_calls.get()
    }
}

#[async_trait(?Send)]
impl PageSource for FixedPages {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_geometry(&self, page_index: u32) -> Result<PageGeometry, PageError> {
        self.geometry_calls.set(self.geometry_calls.get() + 1);
        if self.failing == Some(page_index) {
            return Err(PageError::Geometry {
                page: page_index,
                reason: "broken page".into(),
            });
        }
        self.pages
            .get(page_index as usize)
            .copied()
            .ok_or(PageError::OutOfRange {
                page: page_index,
                page_count: self.page_count(),
            })
    }

    async fn render_page(
        &self,
        request: RenderRequest,
        cancel: CancellationToken,
    ) -> Result<RgbaImage, PageError> {
        let geometry = self.page_geometry(request.page_index).await?;
        if cancel.is_cancelled() {
            return Err(PageError::Cancelled {
                page: request.page_index,
            });
        }
        let (width, height) = request.pixel_size(geometry);
        Ok(RgbaImage::new(width, height))
    }
}
