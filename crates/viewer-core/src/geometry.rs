//! Page and viewport geometry.
//!
//! Everything here is pure arithmetic over scale-1 page sizes and the
//! viewport the host container reports. The async pairing check in the
//! viewer crate fetches geometry and then defers to these functions.

use serde::{Deserialize, Serialize};

/// Size of the host container that pages are laid out in, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height. Zero when the viewport has collapsed.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 200.0,
        }
    }
}

/// Intrinsic size of a page at scale 1, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height
    }

    pub fn scaled(&self, scale: f32) -> ScaledSize {
        ScaledSize {
            width: self.width * scale,
            height: self.height * scale,
        }
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// A page size after scaling, before any rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledSize {
    pub width: f32,
    pub height: f32,
}

/// Scale at which a page fills the viewport height.
///
/// Returns `None` for degenerate pages, which callers treat as "cannot lay
/// out" rather than dividing by zero.
pub fn height_fit_scale(viewport: ViewportSize, page: PageGeometry) -> Option<f32> {
    if !page.is_valid() || viewport.is_empty() {
        return None;
    }
    Some(viewport.height / page.height)
}

/// Decides whether `left` and `right` can share a spread in `viewport`.
///
/// Both pages are drawn at the scale that makes `left` fill the viewport
/// height. The spread fits when `left` alone fits at that scale and the two
/// widths together do as well.
pub fn spread_fits(viewport: ViewportSize, left: PageGeometry, right: PageGeometry) -> bool {
    if !left_page_fits(viewport, left) || !right.is_valid() {
        return false;
    }

    let combined = f64::from(left.width) + f64::from(right.width);
    fits_at_height(viewport, combined, left.height)
}

/// First half of [`spread_fits`]: whether the left page alone fits when scaled
/// to the viewport height. Lets callers skip fetching the right page.
pub fn left_page_fits(viewport: ViewportSize, left: PageGeometry) -> bool {
    if !left.is_valid() || viewport.is_empty() {
        return false;
    }

    fits_at_height(viewport, f64::from(left.width), left.height)
}

/// `width * viewport.height / height <= viewport.width`, cross-multiplied in
/// `f64` so exact fits are not lost to rounding.
fn fits_at_height(viewport: ViewportSize, width: f64, height: f32) -> bool {
    width * f64::from(viewport.height) <= f64::from(viewport.width) * f64::from(height)
}

/// Scale used to draw a page so it fits inside the viewport.
///
/// Fits height unless the page is relatively wider than the viewport, in
/// which case it fits width. The result never overflows either dimension.
pub fn fit_scale(viewport: ViewportSize, page: PageGeometry) -> Option<f32> {
    let height_scale = height_fit_scale(viewport, page)?;

    if page.aspect_ratio() > viewport.aspect_ratio() {
        return Some(viewport.width / page.width);
    }

    Some(height_scale)
}

/// Display and backing-store dimensions of one drawable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceLayout {
    /// Size the surface occupies on screen.
    pub display_width: u32,
    pub display_height: u32,
    /// Size of the pixel buffer, display size times the output scale.
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl SurfaceLayout {
    pub fn for_page(page: PageGeometry, scale: f32, output_scale: f32) -> Self {
        let scaled = page.scaled(scale);

        Self {
            display_width: floor_px(scaled.width),
            display_height: floor_px(scaled.height),
            pixel_width: floor_px(scaled.width * output_scale),
            pixel_height: floor_px(scaled.height * output_scale),
        }
    }
}

fn floor_px(value: f32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.floor() as u32
}
