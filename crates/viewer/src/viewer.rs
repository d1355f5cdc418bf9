//! The book viewer: one document, one viewport, two surfaces.
//!
//! Events (load, resize, next, previous) may overlap freely on the host's
//! cooperative thread. Two generation counters decide which results land:
//!
//! - `moves` is advanced by loads and navigations. A move commits its page
//!   index only while no newer move has started.
//! - `pairing` is advanced by every event. A pairing answer commits only
//!   while no newer event has started. A move whose pairing answer went
//!   stale still commits its index, then re-derives pairing against the
//!   latest viewport.
//!
//! So the last initiated event decides what is shown, and a resize never
//! changes the page index.

use crate::document::BookDocument;
use crate::error::ViewerError;
use crate::loader::{DocumentLoader, LoadOutcome};
use crate::orchestrator::{RenderOrchestrator, Surface, SurfaceSide};
use crate::pairing::SpreadPlanner;
use folio_pdf_engine::{DocumentProvider, OpenSource};
use folio_scheduler::{Generation, GenerationCounter};
use folio_viewer_core::{
    LoadState, NavigationState, PageStep, StartupParams, ViewerConfig, ViewerStatus, ViewportSize,
};
use std::cell::{Cell, RefCell};

pub struct BookViewer<P: DocumentProvider> {
    title: String,
    download: RefCell<String>,
    first_page_alone: bool,
    loader: DocumentLoader<P>,
    orchestrator: RenderOrchestrator,
    viewport: Cell<ViewportSize>,
    navigation: Cell<Option<NavigationState>>,
    moves: GenerationCounter,
    pairing: GenerationCounter,
}

type Document<P> = BookDocument<<P as DocumentProvider>::Document>;

impl<P: DocumentProvider> BookViewer<P> {
    /// Creates a viewer for `params`. Nothing is loaded until [`Self::open`].
    pub fn new(provider: P, params: StartupParams, config: ViewerConfig) -> Self {
        let config = config.merge_params(&params);

        Self {
            title: params.title,
            download: RefCell::new(params.file),
            first_page_alone: config.first_page_alone,
            loader: DocumentLoader::new(provider, config.geometry_cache_capacity),
            orchestrator: RenderOrchestrator::new(config.output_scale),
            viewport: Cell::new(config.initial_viewport),
            navigation: Cell::new(None),
            moves: GenerationCounter::new(),
            pairing: GenerationCounter::new(),
        }
    }

    /// Parses a query string and creates a viewer for it.
    pub fn from_query(provider: P, query: &str, config: ViewerConfig) -> Result<Self, ViewerError> {
        let params = StartupParams::from_query(query)?;
        Ok(Self::new(provider, params, config))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Locator the download control points at.
    pub fn download_link(&self) -> String {
        self.download.borrow().clone()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport.get()
    }

    pub fn navigation(&self) -> Option<NavigationState> {
        self.navigation.get()
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn orchestrator(&self) -> &RenderOrchestrator {
        &self.orchestrator
    }

    pub fn with_surface<R>(&self, side: SurfaceSide, f: impl FnOnce(&Surface) -> R) -> R {
        self.orchestrator.with_surface(side, f)
    }

    /// Calls `listener` on every load state change. See
    /// [`DocumentLoader::subscribe`].
    pub fn subscribe_load(&self, listener: impl FnMut(&LoadState) + 'static) {
        self.loader.subscribe(listener);
    }

    pub fn status(&self) -> ViewerStatus {
        let load = self.loader.state();
        let page_count = load.page_count();
        let status = ViewerStatus::new(self.title.as_str(), self.download_link(), load);

        match (page_count, self.navigation.get()) {
            (Some(page_count), Some(state)) => status.with_navigation(state, page_count),
            _ => status,
        }
    }

    /// Loads the document named by the startup parameters.
    pub async fn open(&self) -> Result<(), ViewerError> {
        let locator = self.download_link();
        self.load(&locator).await
    }

    /// Replaces the current document with the one at `locator`.
    pub async fn load(&self, locator: &str) -> Result<(), ViewerError> {
        *self.download.borrow_mut() = locator.to_owned();
        let moves = self.moves.advance();
        let pairing = self.pairing.advance();
        self.navigation.set(None);
        self.orchestrator.reset();

        let document = match self.loader.load(&OpenSource::from_locator(locator)).await {
            LoadOutcome::Loaded(document) => document,
            LoadOutcome::Failed(message) => return Err(ViewerError::Load(message)),
            LoadOutcome::Superseded => return Ok(()),
        };

        let initial = self.planner(&document).initial().await;
        if self.settle(&document, moves, pairing, initial).await {
            self.refresh(&document).await;
        }
        Ok(())
    }

    /// Reports a new viewport size and re-derives pairing for the current
    /// page. Collapsed viewports are ignored.
    pub async fn resize(&self, viewport: ViewportSize) {
        if viewport.is_empty() {
            tracing::debug!(
                width = viewport.width,
                height = viewport.height,
                "ignoring collapsed viewport"
            );
            return;
        }

        self.viewport.set(viewport);
        let ticket = self.pairing.advance();
        let Some(document) = self.loader.document() else {
            return;
        };

        if self.reevaluate(&document, ticket).await {
            self.refresh(&document).await;
        }
    }

    pub async fn next_page(&self) -> Result<(), ViewerError> {
        self.navigate(PageStep::Forward).await
    }

    pub async fn previous_page(&self) -> Result<(), ViewerError> {
        self.navigate(PageStep::Backward).await
    }

    async fn navigate(&self, step: PageStep) -> Result<(), ViewerError> {
        let (Some(document), Some(state)) = (self.loader.document(), self.navigation.get()) else {
            return Err(ViewerError::NotLoaded);
        };

        let moves = self.moves.advance();
        let pairing = self.pairing.advance();
        let target = self.planner(&document).step(state, step).await;

        if self.settle(&document, moves, pairing, target).await {
            self.refresh(&document).await;
        }
        Ok(())
    }

    fn planner<'a>(&self, document: &'a Document<P>) -> SpreadPlanner<'a, P::Document> {
        SpreadPlanner::new(document, self.viewport.get(), self.first_page_alone)
    }

    /// Commits the outcome of a move. Returns whether anything was committed
    /// that still needs rendering.
    async fn settle(
        &self,
        document: &Document<P>,
        moves: Generation,
        pairing: Generation,
        target: NavigationState,
    ) -> bool {
        if !self.moves.is_current(moves) {
            tracing::debug!(page = target.page_index, "dropping superseded move");
            return false;
        }

        if self.pairing.is_current(pairing) {
            self.commit(target);
            return true;
        }

        // the viewport changed while the move was in flight
        self.commit(NavigationState::new(target.page_index, false));
        let ticket = self.pairing.advance();
        self.reevaluate(document, ticket).await
    }

    /// Re-derives pairing for the current page under `ticket`.
    async fn reevaluate(&self, document: &Document<P>, ticket: Generation) -> bool {
        let Some(state) = self.navigation.get() else {
            return false;
        };

        let next = self.planner(document).reevaluate(state).await;

        let current = self.navigation.get().map(|current| current.page_index);
        let same_page = current == Some(state.page_index);
        if !self.pairing.is_current(ticket) || !same_page {
            tracing::debug!(page = state.page_index, "dropping stale pairing decision");
            return false;
        }

        self.commit(next);
        true
    }

    fn commit(&self, state: NavigationState) {
        tracing::debug!(
            page = state.page_index,
            pair = state.pair_with_next,
            "navigation committed"
        );
        self.navigation.set(Some(state));
    }

    async fn refresh(&self, document: &Document<P>) {
        let Some(state) = self.navigation.get() else {
            return;
        };

        let viewport = self.viewport.get();
        let rendered = self
            .orchestrator
            .render_and_present(document, state, viewport)
            .await;

        match rendered {
            Ok(outcomes) => {
                let presented = outcomes.iter().filter(|o| o.is_presented()).count();
                tracing::trace!(page = state.page_index, presented, "refresh settled");
            }
            Err(error) => {
                tracing::warn!(
                    page = state.page_index,
                    %error,
                    "cannot render, keeping previous frame"
                );
            }
        }
    }
}
