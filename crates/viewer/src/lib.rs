//! Folio book viewer
//!
//! Asynchronous side of the two-page viewer. [`BookViewer`] takes host
//! events (load, resize, next, previous), decides which pages to show using
//! the pure rules in `folio-viewer-core`, and renders them into two surfaces
//! through a [`folio_pdf_engine::PageSource`].
//!
//! Everything runs on one cooperative thread. Futures are not `Send`; drive
//! them with whatever local executor the host has.

mod document;
mod error;
mod loader;
mod navigation;
mod orchestrator;
mod pairing;
mod viewer;

#[cfg(test)]
mod test_support;

pub use document::BookDocument;
pub use error::ViewerError;
pub use loader::{DocumentLoader, LoadOutcome};
pub use orchestrator::{RenderHandle, RenderOrchestrator, RenderOutcome, Surface, SurfaceSide};
pub use pairing::SpreadPlanner;
pub use viewer::BookViewer;
