//! Folio Scheduler Library
//!
//! Bookkeeping for superseding asynchronous work on a single cooperative
//! thread: cancellation tokens for renders, generation tags for "last
//! initiated wins" ordering, and a per-surface registry that keeps at most
//! one render in flight on each surface.
//!
//! # Example
//!
//! ```
//! use folio_scheduler::{GenerationCounter, SlotRegistry};
//!
//! let renders = GenerationCounter::new();
//! let slots = SlotRegistry::new();
//!
//! let first = slots.issue("left", renders.advance());
//! let second = slots.issue("left", renders.advance());
//!
//! // The older render on the same surface was cancelled.
//! assert!(first.is_cancelled());
//! assert!(!second.is_cancelled());
//! ```

mod cancel;
mod generation;
mod slots;

pub use cancel::CancellationToken;
pub use generation::{Generation, GenerationCounter};
pub use slots::SlotRegistry;
