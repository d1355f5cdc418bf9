//! Document provider seam for the Folio viewer.
//!
//! The viewer core never decodes PDF content itself. It talks to a
//! [`DocumentProvider`] that opens a document while reporting progress, and to
//! the resulting [`PageSource`] for page count, per-page geometry and
//! cancellable page renders. [`LopdfProvider`] is the bundled implementation.

mod error;
mod lopdf_backend;
mod provider;
mod task;

pub use error::{DocumentLoadError, PageError};
pub use lopdf_backend::{page_geometries, LopdfDocument, LopdfProvider, DEFAULT_PAGE};
pub use provider::{
    DocumentProvider, LoadProgress, OpenSource, PageSource, ProgressSink, RenderRequest,
};
pub use task::{yield_now, YieldNow};

pub use image::RgbaImage;

pub fn default_provider() -> LopdfProvider {
    LopdfProvider::new()
}
