use folio_pdf_engine::{PageError, PageSource};
use folio_viewer_core::{GeometryCache, PageGeometry};
use std::cell::RefCell;
use std::rc::Rc;

/// A loaded document as seen by the viewer: the provider's page source plus a
/// cache of page geometry, which pairing asks for on every resize.
pub struct BookDocument<D> {
    source: Rc<D>,
    geometry: RefCell<GeometryCache>,
}

impl<D: PageSource + 'static> BookDocument<D> {
    pub fn new(source: D, cache_capacity: usize) -> Self {
        Self {
            source: Rc::new(source),
            geometry: RefCell::new(GeometryCache::new(cache_capacity)),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.source.page_count()
    }

    /// Geometry of a page at scale 1, served from cache when possible.
    pub async fn geometry(&self, page_index: u32) -> Result<PageGeometry, PageError> {
        let cached = self.geometry.borrow_mut().get(page_index);
        if let Some(geometry) = cached {
            return Ok(geometry);
        }

        let geometry = self.source.page_geometry(page_index).await?;
        self.geometry.borrow_mut().insert(page_index, geometry);
        Ok(geometry)
    }

    /// Shared handle on the page source, for renders that outlive a borrow.
    pub fn source(&self) -> Rc<D> {
        Rc::clone(&self.source)
    }

    pub fn cache_stats(&self) -> (u64, u64) {
        self.geometry.borrow().stats()
    }
}

impl<D> std::fmt::Debug for BookDocument<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookDocument")
            .field("cached_pages", &self.geometry.borrow().len())
            .finish()
    }
}
