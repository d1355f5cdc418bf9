//! Document provider backed by `lopdf`.
//!
//! Page geometry comes from the page tree (crop box, media box, rotation,
//! honouring inheritance). Rendering produces a blank page with a light frame
//! at the requested size; there is no content rasteriser in this backend.

use crate::error::{DocumentLoadError, PageError};
use crate::provider::{
    DocumentProvider, LoadProgress, OpenSource, PageSource, ProgressSink, RenderRequest,
};
use crate::task::yield_now;
use async_trait::async_trait;
use folio_scheduler::CancellationToken;
use folio_viewer_core::PageGeometry;
use image::{Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// US Letter, used when a page has no usable box.
pub const DEFAULT_PAGE: PageGeometry = PageGeometry {
    width: 612.0,
    height: 792.0,
};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const MAX_TREE_DEPTH: usize = 32;
const RENDER_BAND_ROWS: u32 = 64;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME: Rgba<u8> = Rgba([220, 220, 220, 255]);

#[derive(Debug, Clone)]
pub struct LopdfProvider {
    chunk_size: usize,
}

impl Default for LopdfProvider {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl LopdfProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes read between progress reports.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    async fn read_chunked(
        &self,
        path: &Path,
        progress: ProgressSink<'_>,
    ) -> Result<Vec<u8>, DocumentLoadError> {
        if !path.is_file() {
            return Err(DocumentLoadError::NotFound(path.display().to_string()));
        }

        let mut file = File::open(path)?;
        let total = file.metadata()?.len();
        let mut bytes = Vec::with_capacity(total as usize);
        let mut chunk = vec![0; self.chunk_size];

        loop {
            let read = file.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            progress(LoadProgress {
                loaded: bytes.len() as u64,
                total,
            });
            yield_now().await;
        }

        Ok(bytes)
    }
}

#[async_trait(?Send)]
impl DocumentProvider for LopdfProvider {
    type Document = LopdfDocument;

    async fn open(
        &self,
        source: &OpenSource,
        progress: ProgressSink<'_>,
    ) -> Result<LopdfDocument, DocumentLoadError> {
        let bytes = match source {
            OpenSource::Path(path) => self.read_chunked(path, progress).await?,
            OpenSource::Bytes(bytes) => {
                let total = bytes.len() as u64;
                progress(LoadProgress {
                    loaded: total,
                    total,
                });
                bytes.clone()
            }
        };

        let pages = page_geometries(&bytes)?;
        tracing::debug!(
            source = %source.describe(),
            pages = pages.len(),
            "parsed page tree"
        );

        Ok(LopdfDocument { pages })
    }
}

/// A parsed document. Geometry is resolved for every page at open time.
#[derive(Debug, Clone)]
pub struct LopdfDocument {
    pages: Vec<PageGeometry>,
}

impl LopdfDocument {
    fn geometry(&self, page_index: u32) -> Result<PageGeometry, PageError> {
        self.pages
            .get(page_index as usize)
            .copied()
            .ok_or(PageError::OutOfRange {
                page: page_index,
                page_count: self.page_count(),
            })
    }
}

#[async_trait(?Send)]
impl PageSource for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_geometry(&self, page_index: u32) -> Result<PageGeometry, PageError> {
        self.geometry(page_index)
    }

    async fn render_page(
        &self,
        request: RenderRequest,
        cancel: CancellationToken,
    ) -> Result<RgbaImage, PageError> {
        let page = request.page_index;
        let geometry = self.geometry(page)?;

        let RenderRequest {
            scale,
            output_scale,
            ..
        } = request;
        if !(scale > 0.0 && output_scale > 0.0) {
            return Err(PageError::Render {
                page,
                reason: format!("invalid scale {scale} x {output_scale}"),
            });
        }

        let (width, height) = request.pixel_size(geometry);
        let mut image = RgbaImage::new(width, height);

        let mut row = 0;
        while row < height {
            if cancel.is_cancelled() {
                return Err(PageError::Cancelled { page });
            }

            let band_end = (row + RENDER_BAND_ROWS).min(height);
            for y in row..band_end {
                for x in 0..width {
                    let edge = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
                    let framed = edge && width >= 4 && height >= 4;
                    image.put_pixel(x, y, if framed { FRAME } else { PAPER });
                }
            }
            row = band_end;
            yield_now().await;
        }

        if cancel.is_cancelled() {
            return Err(PageError::Cancelled { page });
        }

        Ok(image)
    }
}

/// Resolves the displayed size of every page in a PDF.
pub fn page_geometries(bytes: &[u8]) -> Result<Vec<PageGeometry>, DocumentLoadError> {
    let marker = b"/Encrypt";
    if bytes.windows(marker.len()).any(|window| window == marker) {
        return Err(DocumentLoadError::EncryptedUnsupported);
    }

    let doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();
    let mut geometries = Vec::with_capacity(pages.len());

    for (_, object_id) in pages {
        let page = doc.get_dictionary(object_id)?;
        geometries.push(displayed_geometry(&doc, page));
    }

    if geometries.is_empty() {
        return Err(DocumentLoadError::NoPages);
    }

    Ok(geometries)
}

fn displayed_geometry(doc: &Document, page: &Dictionary) -> PageGeometry {
    let view = page_box(doc, page, b"CropBox")
        .or_else(|| page_box(doc, page, b"MediaBox"))
        .unwrap_or(DEFAULT_PAGE);

    let rotation = inherited(doc, page, b"Rotate")
        .and_then(|object| object.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);

    match rotation {
        90 | 270 => PageGeometry::new(view.height, view.width),
        _ => view,
    }
}

/// Looks `key` up on the page, then on its ancestors in the page tree.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return doc.dereference(value).ok().map(|(_, object)| object);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

fn page_box(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<PageGeometry> {
    inherited(doc, page, key).and_then(|object| rectangle(doc, object))
}

fn rectangle(doc: &Document, object: &Object) -> Option<PageGeometry> {
    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }

    let mut coords = [0.0_f32; 4];
    for (slot, value) in coords.iter_mut().zip(array) {
        let (_, value) = doc.dereference(value).ok()?;
        *slot = value.as_float().ok()?;
    }

    let [x0, y0, x1, y1] = coords;
    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();

    (width > 0.0 && height > 0.0).then(|| PageGeometry::new(width, height))
}
