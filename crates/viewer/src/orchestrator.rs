//! Render orchestration for the two page surfaces.
//!
//! Every call to [`RenderOrchestrator::render`] starts a new render
//! generation. Geometry is fetched first; if a newer render started in the
//! meantime nothing is issued. Otherwise each visible surface gets a render
//! whose token supersedes (and cancels) the previous one on that surface.
//! Results are presented by [`RenderOrchestrator::complete`] only while their
//! render still owns the surface, so a slow stale render can never overwrite
//! a newer frame.

use crate::document::BookDocument;
use folio_pdf_engine::{PageError, PageSource, RenderRequest, RgbaImage};
use folio_scheduler::{CancellationToken, Generation, GenerationCounter, SlotRegistry};
use folio_viewer_core::{fit_scale, NavigationState, PageGeometry, SurfaceLayout, ViewportSize};
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSide {
    Left,
    Right,
}

impl SurfaceSide {
    fn slot(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// What a surface currently shows.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    /// Page whose pixels are presented.
    pub page_index: Option<u32>,
    pub layout: Option<SurfaceLayout>,
    pub pixels: Option<RgbaImage>,
    pub visible: bool,
}

impl Surface {
    fn present(&mut self, page_index: u32, layout: SurfaceLayout, pixels: RgbaImage) {
        self.page_index = Some(page_index);
        self.layout = Some(layout);
        self.pixels = Some(pixels);
        self.visible = true;
    }
}

/// How an issued render ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Presented { side: SurfaceSide, page_index: u32 },
    /// Superseded or cancelled. Output, if any, was discarded.
    Cancelled { side: SurfaceSide, page_index: u32 },
    /// The surface keeps its previous frame.
    Failed {
        side: SurfaceSide,
        page_index: u32,
        error: PageError,
    },
}

impl RenderOutcome {
    pub fn is_presented(&self) -> bool {
        matches!(self, Self::Presented { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// What to do with the right surface for one render.
enum RightSurface {
    Render(u32, PageGeometry),
    /// Geometry failed: the previous frame stays up.
    Keep,
    Hide,
}

/// A render issued for one surface. Hand it back to
/// [`RenderOrchestrator::complete`] to drive it and present the result.
pub struct RenderHandle {
    side: SurfaceSide,
    page_index: u32,
    generation: Generation,
    layout: SurfaceLayout,
    token: CancellationToken,
    task: LocalBoxFuture<'static, Result<RgbaImage, PageError>>,
}

impl RenderHandle {
    pub fn side(&self) -> SurfaceSide {
        self.side
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl std::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("side", &self.side)
            .field("page_index", &self.page_index)
            .field("generation", &self.generation)
            .field("layout", &self.layout)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[derive(Debug)]
pub struct RenderOrchestrator {
    output_scale: f32,
    generations: GenerationCounter,
    slots: SlotRegistry<SurfaceSide>,
    surfaces: RefCell<[Surface; 2]>,
}

impl RenderOrchestrator {
    pub fn new(output_scale: f32) -> Self {
        Self {
            output_scale,
            generations: GenerationCounter::new(),
            slots: SlotRegistry::new(),
            surfaces: RefCell::new([Surface::default(), Surface::default()]),
        }
    }

    pub fn output_scale(&self) -> f32 {
        self.output_scale
    }

    /// Generation of the most recently started render.
    pub fn generation(&self) -> Generation {
        self.generations.current()
    }

    /// Number of surfaces with a render in flight.
    pub fn in_flight(&self) -> usize {
        self.slots.in_flight()
    }

    /// Starts rendering `state` into the surfaces.
    ///
    /// Returns no handles when a newer render started while geometry was
    /// being fetched. A geometry failure on the left page is returned as an
    /// error; one on the right page skips that surface's update.
    pub async fn render<D: PageSource + 'static>(
        &self,
        document: &BookDocument<D>,
        state: NavigationState,
        viewport: ViewportSize,
    ) -> Result<Vec<RenderHandle>, PageError> {
        let generation = self.generations.advance();

        let left = document.geometry(state.page_index).await?;
        let right = match state.right_page() {
            Some(page) => match document.geometry(page).await {
                Ok(geometry) => RightSurface::Render(page, geometry),
                Err(error) => {
                    tracing::warn!(page, %error, "keeping previous right frame");
                    RightSurface::Keep
                }
            },
            None => RightSurface::Hide,
        };

        if !self.generations.is_current(generation) {
            tracing::debug!(
                generation = generation.raw(),
                "render superseded before issue"
            );
            return Ok(Vec::new());
        }

        let scale = fit_scale(viewport, left).ok_or_else(|| PageError::Geometry {
            page: state.page_index,
            reason: format!(
                "cannot fit {}x{} into {}x{}",
                left.width, left.height, viewport.width, viewport.height
            ),
        })?;

        let mut handles = vec![self.issue(
            document,
            SurfaceSide::Left,
            state.page_index,
            left,
            scale,
            generation,
        )];

        match right {
            RightSurface::Render(page, geometry) => {
                let handle = self.issue(
                    document,
                    SurfaceSide::Right,
                    page,
                    geometry,
                    scale,
                    generation,
                );
                handles.push(handle);
            }
            RightSurface::Keep => {
                self.slots.cancel(SurfaceSide::Right);
            }
            RightSurface::Hide => self.hide(SurfaceSide::Right),
        }

        tracing::debug!(
            generation = generation.raw(),
            page = state.page_index,
            pair = state.pair_with_next,
            scale,
            "renders issued"
        );
        Ok(handles)
    }

    fn issue<D: PageSource + 'static>(
        &self,
        document: &BookDocument<D>,
        side: SurfaceSide,
        page_index: u32,
        geometry: PageGeometry,
        scale: f32,
        generation: Generation,
    ) -> RenderHandle {
        let layout = SurfaceLayout::for_page(geometry, scale, self.output_scale);
        let token = self.slots.issue(side, generation);
        let request = RenderRequest {
            page_index,
            scale,
            output_scale: self.output_scale,
        };

        let source = document.source();
        let cancel = token.clone();
        let task = async move { source.render_page(request, cancel).await };

        RenderHandle {
            side,
            page_index,
            generation,
            layout,
            token,
            task: task.boxed_local(),
        }
    }

    /// Drives an issued render and presents its output if it still owns the
    /// surface.
    pub async fn complete(&self, handle: RenderHandle) -> RenderOutcome {
        let RenderHandle {
            side,
            page_index,
            generation,
            layout,
            token,
            task,
        } = handle;
        let result = task.await;

        if token.is_cancelled() || !self.slots.is_current(side, generation) {
            tracing::trace!(
                ?side,
                page_index,
                generation = generation.raw(),
                "discarding superseded render"
            );
            return RenderOutcome::Cancelled { side, page_index };
        }
        self.slots.complete(side, generation);

        match result {
            Ok(pixels) => {
                self.surfaces.borrow_mut()[side.slot()].present(page_index, layout, pixels);
                RenderOutcome::Presented { side, page_index }
            }
            Err(error) if error.is_cancelled() => RenderOutcome::Cancelled { side, page_index },
            Err(error) => {
                tracing::warn!(
                    ?side,
                    page_index,
                    %error,
                    "render failed, keeping previous frame"
                );
                RenderOutcome::Failed {
                    side,
                    page_index,
                    error,
                }
            }
        }
    }

    /// Renders `state` and waits for every surface to settle.
    pub async fn render_and_present<D: PageSource + 'static>(
        &self,
        document: &BookDocument<D>,
        state: NavigationState,
        viewport: ViewportSize,
    ) -> Result<Vec<RenderOutcome>, PageError> {
        let handles = self.render(document, state, viewport).await?;
        let outcomes = handles.into_iter().map(|handle| self.complete(handle));
        Ok(future::join_all(outcomes).await)
    }

    /// Cancels any render on `side` and takes the surface off screen.
    pub fn hide(&self, side: SurfaceSide) {
        self.slots.cancel(side);
        self.surfaces.borrow_mut()[side.slot()].visible = false;
    }

    /// Cancels all renders and blanks both surfaces.
    pub fn reset(&self) {
        self.generations.advance();
        let cancelled = self.slots.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "cancelled renders on reset");
        }
        *self.surfaces.borrow_mut() = [Surface::default(), Surface::default()];
    }

    /// Runs `f` against a surface.
    pub fn with_surface<R>(&self, side: SurfaceSide, f: impl FnOnce(&Surface) -> R) -> R {
        f(&self.surfaces.borrow()[side.slot()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedPages;
    use futures::executor::block_on;

    const VIEWPORT: ViewportSize = ViewportSize {
        width: 800.0,
        height: 600.0,
    };

    fn book(geometry: PageGeometry) -> BookDocument<FixedPages> {
        BookDocument::new(FixedPages::uniform(6, geometry), 8)
    }

    fn show(
        orchestrator: &RenderOrchestrator,
        doc: &BookDocument<FixedPages>,
        state: NavigationState,
    ) -> Result<Vec<RenderOutcome>, PageError> {
        block_on(orchestrator.render_and_present(doc, state, VIEWPORT))
    }

    fn start(
        orchestrator: &RenderOrchestrator,
        doc: &BookDocument<FixedPages>,
        state: NavigationState,
    ) -> Vec<RenderHandle> {
        block_on(orchestrator.render(doc, state, VIEWPORT)).unwrap()
    }

    fn presented(side: SurfaceSide, page_index: u32) -> RenderOutcome {
        RenderOutcome::Presented { side, page_index }
    }

    #[test]
    fn single_page_layout_uses_height_fit_and_supersampling() {
        let doc = book(PageGeometry::new(500.0, 700.0));
        let orchestrator = RenderOrchestrator::new(4.0);

        let outcomes = show(&orchestrator, &doc, NavigationState::new(0, false)).unwrap();
        assert_eq!(outcomes, vec![presented(SurfaceSide::Left, 0)]);

        orchestrator.with_surface(SurfaceSide::Left, |surface| {
            let layout = surface.layout.unwrap();
            let pixels = surface.pixels.as_ref().unwrap();
            assert_eq!((layout.display_width, layout.display_height), (428, 600));
            assert_eq!((layout.pixel_width, layout.pixel_height), (1714, 2400));
            assert_eq!(pixels.dimensions(), (1714, 2400));
            assert!(surface.visible);
        });
        let right_visible = orchestrator.with_surface(SurfaceSide::Right, |s| s.visible);
        assert!(!right_visible);
    }

    #[test]
    fn spread_renders_both_surfaces_at_left_page_scale() {
        let doc = book(PageGeometry::new(300.0, 700.0));
        let orchestrator = RenderOrchestrator::new(1.0);

        let outcomes = show(&orchestrator, &doc, NavigationState::new(2, true)).unwrap();
        assert!(outcomes.iter().all(RenderOutcome::is_presented));
        let right_page = orchestrator.with_surface(SurfaceSide::Right, |s| s.page_index);
        assert_eq!(right_page, Some(3));

        let left = orchestrator.with_surface(SurfaceSide::Left, |s| s.layout.unwrap());
        let right = orchestrator.with_surface(SurfaceSide::Right, |s| s.layout.unwrap());
        assert_eq!(left, right);
        assert_eq!(orchestrator.in_flight(), 0);
    }

    #[test]
    fn wide_page_fits_width() {
        let doc = book(PageGeometry::new(1600.0, 600.0));
        let orchestrator = RenderOrchestrator::new(1.0);

        show(&orchestrator, &doc, NavigationState::new(0, false)).unwrap();
        let layout = orchestrator.with_surface(SurfaceSide::Left, |s| s.layout.unwrap());
        assert_eq!((layout.display_width, layout.display_height), (800, 300));
    }

    #[test]
    fn newer_render_cancels_older_on_same_surface() {
        let doc = book(PageGeometry::new(300.0, 700.0));
        let orchestrator = RenderOrchestrator::new(1.0);

        let first = start(&orchestrator, &doc, NavigationState::new(0, false));
        let second = start(&orchestrator, &doc, NavigationState::new(1, false));

        let mut outcomes = Vec::new();
        for handle in first.into_iter().chain(second) {
            outcomes.push(block_on(orchestrator.complete(handle)));
        }

        let cancelled = RenderOutcome::Cancelled {
            side: SurfaceSide::Left,
            page_index: 0,
        };
        assert_eq!(outcomes, vec![cancelled, presented(SurfaceSide::Left, 1)]);
        let left_page = orchestrator.with_surface(SurfaceSide::Left, |s| s.page_index);
        assert_eq!(left_page, Some(1));
    }

    #[test]
    fn failed_render_keeps_previous_frame() {
        let pages = FixedPages::uniform(6, PageGeometry::new(300.0, 700.0)).failing_on(1);
        let doc = BookDocument::new(pages, 8);
        let orchestrator = RenderOrchestrator::new(1.0);

        show(&orchestrator, &doc, NavigationState::new(0, false)).unwrap();
        let err = show(&orchestrator, &doc, NavigationState::new(1, false)).unwrap_err();

        assert!(matches!(err, PageError::Geometry { page: 1, .. }));
        let left_page = orchestrator.with_surface(SurfaceSide::Left, |s| s.page_index);
        assert_eq!(left_page, Some(0));
    }

    #[test]
    fn right_geometry_failure_keeps_previous_right_frame() {
        let pages = FixedPages::uniform(6, PageGeometry::new(300.0, 700.0)).failing_on(3);
        let doc = BookDocument::new(pages, 8);
        let orchestrator = RenderOrchestrator::new(1.0);

        show(&orchestrator, &doc, NavigationState::new(0, true)).unwrap();
        let outcomes = show(&orchestrator, &doc, NavigationState::new(2, true)).unwrap();

        assert_eq!(outcomes, vec![presented(SurfaceSide::Left, 2)]);
        orchestrator.with_surface(SurfaceSide::Right, |surface| {
            assert!(surface.visible);
            assert_eq!(surface.page_index, Some(1));
            assert!(surface.pixels.is_some());
        });
        assert_eq!(orchestrator.in_flight(), 0);
    }

    #[test]
    fn right_geometry_failure_cancels_pending_right_render() {
        let pages = FixedPages::uniform(6, PageGeometry::new(300.0, 700.0)).failing_on(3);
        let doc = BookDocument::new(pages, 8);
        let orchestrator = RenderOrchestrator::new(1.0);

        let pending = start(&orchestrator, &doc, NavigationState::new(0, true));
        show(&orchestrator, &doc, NavigationState::new(2, true)).unwrap();

        assert!(pending.iter().all(RenderHandle::is_cancelled));
        let right_page = orchestrator.with_surface(SurfaceSide::Right, |s| s.page_index);
        assert_eq!(right_page, None);
    }

    #[test]
    fn unpaired_render_hides_right_surface() {
        let doc = book(PageGeometry::new(300.0, 700.0));
        let orchestrator = RenderOrchestrator::new(1.0);

        show(&orchestrator, &doc, NavigationState::new(0, true)).unwrap();
        assert!(orchestrator.with_surface(SurfaceSide::Right, |s| s.visible));

        show(&orchestrator, &doc, NavigationState::new(5, false)).unwrap();
        let right_visible = orchestrator.with_surface(SurfaceSide::Right, |s| s.visible);
        assert!(!right_visible);
    }

    #[test]
    fn reset_cancels_outstanding_renders() {
        let doc = book(PageGeometry::new(300.0, 700.0));
        let orchestrator = RenderOrchestrator::new(1.0);

        let handles = start(&orchestrator, &doc, NavigationState::new(0, true));
        assert_eq!(orchestrator.in_flight(), 2);

        orchestrator.reset();
        assert!(handles.iter().all(RenderHandle::is_cancelled));
        for handle in handles {
            assert!(block_on(orchestrator.complete(handle)).is_cancelled());
        }
        let blank = orchestrator.with_surface(SurfaceSide::Left, |s| s.pixels.is_none());
        assert!(blank);
    }
}
