//! Folio viewer core
//!
//! Synchronous model of the two-page book viewer: page and viewport geometry,
//! spread fitting, navigation arithmetic, load lifecycle, indicator text,
//! startup parameters and configuration. Nothing here performs I/O against a
//! document; the `folio-viewer` crate drives these pieces asynchronously.

pub mod cache;
pub mod config;
pub mod geometry;
pub mod load_state;
pub mod navigation;
pub mod params;
pub mod status;

pub use cache::GeometryCache;
pub use config::{ConfigError, ViewerConfig};
pub use geometry::{
    fit_scale, height_fit_scale, left_page_fits, spread_fits, PageGeometry, ScaledSize,
    SurfaceLayout, ViewportSize,
};
pub use load_state::LoadState;
pub use navigation::{
    backward_candidate, forward_candidate, may_pair, resolve_candidate, NavigationState, PageStep,
};
pub use params::{ParamsError, StartupParams, DEFAULT_TITLE};
pub use status::{page_label, ViewerStatus};
