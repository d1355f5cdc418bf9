//! Document loading with progress and supersession.

use crate::document::BookDocument;
use folio_pdf_engine::{DocumentProvider, LoadProgress, OpenSource, PageSource};
use folio_scheduler::GenerationCounter;
use folio_viewer_core::LoadState;
use std::cell::RefCell;
use std::rc::Rc;

type Listener = Box<dyn FnMut(&LoadState)>;

/// Result of one [`DocumentLoader::load`] call.
pub enum LoadOutcome<D> {
    Loaded(Rc<BookDocument<D>>),
    Failed(String),
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
}

impl<D> std::fmt::Debug for LoadOutcome<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded(document) => f.debug_tuple("Loaded").field(document).finish(),
            Self::Failed(message) => f.debug_tuple("Failed").field(message).finish(),
            Self::Superseded => f.write_str("Superseded"),
        }
    }
}

/// Owns the current document and its [`LoadState`].
///
/// Starting a load releases the previous document. Only the most recently
/// started load may change the state; progress and results of older loads
/// are ignored.
pub struct DocumentLoader<P: DocumentProvider> {
    provider: P,
    cache_capacity: usize,
    generations: GenerationCounter,
    state: RefCell<LoadState>,
    document: RefCell<Option<Rc<BookDocument<P::Document>>>>,
    listeners: RefCell<Vec<Listener>>,
}

impl<P: DocumentProvider> DocumentLoader<P> {
    pub fn new(provider: P, cache_capacity: usize) -> Self {
        Self {
            provider,
            cache_capacity,
            generations: GenerationCounter::new(),
            state: RefCell::new(LoadState::loading()),
            document: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    pub fn document(&self) -> Option<Rc<BookDocument<P::Document>>> {
        self.document.borrow().clone()
    }

    /// Calls `listener` with every state change, including each progress
    /// step. Listeners must not call back into the loader.
    pub fn subscribe(&self, listener: impl FnMut(&LoadState) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Drops the current document, if any.
    pub fn release(&self) {
        if self.document.borrow_mut().take().is_some() {
            tracing::debug!("released previous document");
        }
    }

    pub async fn load(&self, source: &OpenSource) -> LoadOutcome<P::Document> {
        let generation = self.generations.advance();
        self.release();
        self.update(|state| {
            *state = LoadState::loading();
            true
        });
        tracing::info!(
            source = %source.describe(),
            generation = generation.raw(),
            "loading document"
        );

        let result = {
            let mut on_progress = |progress: LoadProgress| {
                let LoadProgress { loaded, total } = progress;
                if self.generations.is_current(generation) {
                    self.update(|state| state.report_progress(loaded, total));
                }
            };
            self.provider.open(source, &mut on_progress).await
        };

        if !self.generations.is_current(generation) {
            tracing::debug!(
                generation = generation.raw(),
                "discarding superseded load"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(document) => {
                let page_count = document.page_count();
                let document = Rc::new(BookDocument::new(document, self.cache_capacity));
                *self.document.borrow_mut() = Some(Rc::clone(&document));
                self.update(|state| state.finish(page_count));
                tracing::info!(page_count, "document loaded");
                LoadOutcome::Loaded(document)
            }
            Err(error) => {
                let message = error.to_string();
                tracing::warn!(%message, "document failed to load");
                self.update(|state| state.fail(message.clone()));
                LoadOutcome::Failed(message)
            }
        }
    }

    fn update(&self, change: impl FnOnce(&mut LoadState) -> bool) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            if !change(&mut state) {
                return;
            }
            state.clone()
        };

        for listener in self.listeners.borrow_mut().iter_mut() {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedPages;
    use async_trait::async_trait;
    use folio_pdf_engine::{yield_now, DocumentLoadError, ProgressSink};
    use folio_viewer_core::PageGeometry;
    use futures::executor::block_on;

    /// Reports `steps` progress updates, yielding between them.
    struct Staged {
        steps: u64,
        pages: u32,
    }

    #[async_trait(?Send)]
    impl DocumentProvider for Staged {
        type Document = FixedPages;

        async fn open(
            &self,
            source: &OpenSource,
            progress: ProgressSink<'_>,
        ) -> Result<FixedPages, DocumentLoadError> {
            if let OpenSource::Path(path) = source {
                return Err(DocumentLoadError::NotFound(path.display().to_string()));
            }
            for loaded in 1..=self.steps {
                progress(LoadProgress {
                    loaded,
                    total: self.steps,
                });
                yield_now().await;
            }
            let geometry = PageGeometry::new(300.0, 700.0);
            Ok(FixedPages::uniform(self.pages, geometry))
        }
    }

    fn loader(pages: u32) -> DocumentLoader<Staged> {
        DocumentLoader::new(Staged { steps: 4, pages }, 8)
    }

    #[test]
    fn load_reports_monotonic_progress_then_page_count() {
        let loader = loader(12);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        loader.subscribe(move |state| sink.borrow_mut().push(state.clone()));

        let outcome = block_on(loader.load(&OpenSource::Bytes(Vec::new())));
        match outcome {
            LoadOutcome::Loaded(doc) => assert_eq!(doc.page_count(), 12),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let seen = seen.borrow();
        let progress: Vec<f32> = seen.iter().filter_map(LoadState::progress).collect();
        assert_eq!(progress, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(seen.last(), Some(&LoadState::Loaded { page_count: 12 }));
        assert!(loader.document().is_some());
    }

    #[test]
    fn failed_load_keeps_error_message() {
        let loader = loader(3);
        let outcome = block_on(loader.load(&OpenSource::from_locator("/nope.pdf")));

        match outcome {
            LoadOutcome::Failed(message) => assert!(message.contains("/nope.pdf")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let state = loader.state();
        assert_eq!(state.error(), Some("file does not exist: /nope.pdf"));
        assert!(loader.document().is_none());
    }

    #[test]
    fn newer_load_supersedes_older_one() {
        let loader = loader(5);
        let first_source = OpenSource::Bytes(vec![1]);
        let second_source = OpenSource::from_locator("/second.pdf");
        let (first, second) = block_on(async {
            futures::join!(loader.load(&first_source), loader.load(&second_source),)
        });

        assert!(matches!(first, LoadOutcome::Superseded));
        assert!(matches!(second, LoadOutcome::Failed(_)));
        assert!(loader.document().is_none());
        assert!(matches!(loader.state(), LoadState::Failed { .. }));
    }

    #[test]
    fn reload_releases_previous_document() {
        let loader = loader(5);
        block_on(loader.load(&OpenSource::Bytes(Vec::new())));
        let previous = loader.document().unwrap();

        block_on(loader.load(&OpenSource::from_locator("/gone.pdf")));
        assert!(loader.document().is_none());
        assert_eq!(Rc::strong_count(&previous), 1);
    }
}
