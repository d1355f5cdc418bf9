use crate::error::{DocumentLoadError, PageError};
use async_trait::async_trait;
use folio_scheduler::CancellationToken;
use folio_viewer_core::PageGeometry;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl OpenSource {
    /// Interprets the `file` startup parameter. A `file://` prefix is
    /// stripped; anything else is taken as a filesystem path.
    pub fn from_locator(locator: &str) -> Self {
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        Self::Path(PathBuf::from(path))
    }

    /// Human-readable form for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Bytes read so far out of the total, as reported while a document loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: u64,
}

/// Receiver of [`LoadProgress`] updates during [`DocumentProvider::open`].
pub type ProgressSink<'a> = &'a mut dyn FnMut(LoadProgress);

/// Parameters of one page render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    /// Layout scale: page points to display pixels.
    pub scale: f32,
    /// Supersampling factor on top of `scale` for the pixel buffer.
    pub output_scale: f32,
}

impl RenderRequest {
    /// Pixel dimensions of the rendered buffer for a page of `geometry`.
    pub fn pixel_size(&self, geometry: PageGeometry) -> (u32, u32) {
        let layout =
            folio_viewer_core::SurfaceLayout::for_page(geometry, self.scale, self.output_scale);
        (layout.pixel_width.max(1), layout.pixel_height.max(1))
    }
}

/// An open document: page count, page geometry and page rendering.
///
/// Methods may suspend. Implementations run on the viewer's single
/// cooperative thread, so futures need not be `Send`.
#[async_trait(?Send)]
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Intrinsic size of a page at scale 1.
    async fn page_geometry(&self, page_index: u32) -> Result<PageGeometry, PageError>;

    /// Renders a page into a fresh pixel buffer.
    ///
    /// Implementations should return [`PageError::Cancelled`] once `cancel`
    /// fires; callers discard the output of cancelled renders either way.
    async fn render_page(
        &self,
        request: RenderRequest,
        cancel: CancellationToken,
    ) -> Result<RgbaImage, PageError>;
}

/// Opens documents, reporting progress while it does.
#[async_trait(?Send)]
pub trait DocumentProvider {
    type Document: PageSource + 'static;

    async fn open(
        &self,
        source: &OpenSource,
        progress: ProgressSink<'_>,
    ) -> Result<Self::Document, DocumentLoadError>;
}
