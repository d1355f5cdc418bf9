#![allow(dead_code)]

use async_trait::async_trait;
use folio_pdf_engine::{
    yield_now, DocumentLoadError, DocumentProvider, LoadProgress, OpenSource, PageError,
    PageSource, ProgressSink, RenderRequest, RgbaImage,
};
use folio_scheduler::CancellationToken;
use folio_viewer_core::PageGeometry;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

pub fn uniform(count: usize, width: f32, height: f32) -> Vec<PageGeometry> {
    vec![PageGeometry::new(width, height); count]
}

/// Knobs shared by a provider and every document it opens.
#[derive(Default)]
pub struct Script {
    /// Suspensions before each geometry answer.
    pub geometry_yields: Cell<u32>,
    /// Suspensions before a render of the given page completes.
    pub render_yields: RefCell<HashMap<u32, u32>>,
    pub geometry_calls: Cell<u32>,
    /// Pages whose render ran to completion, in order.
    pub rendered: RefCell<Vec<u32>>,
}

impl Script {
    pub fn slow_render(&self, page: u32, yields: u32) {
        self.render_yields.borrow_mut().insert(page, yields);
    }

    fn render_yields_for(&self, page: u32) -> u32 {
        let yields = self.render_yields.borrow();
        yields.get(&page).copied().unwrap_or(0)
    }
}

/// Opens in-memory books by locator, reporting progress in four steps.
/// Unknown locators fail as a decode error.
pub struct ScriptedProvider {
    books: HashMap<String, Vec<PageGeometry>>,
    script: Rc<Script>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
            script: Rc::new(Script::default()),
        }
    }

    pub fn with_book(mut self, locator: &str, pages: Vec<PageGeometry>) -> Self {
        self.books.insert(locator.to_owned(), pages);
        self
    }

    pub fn script(&self) -> Rc<Script> {
        Rc::clone(&self.script)
    }
}

#[async_trait(?Send)]
impl DocumentProvider for ScriptedProvider {
    type Document = ScriptedPages;

    async fn open(
        &self,
        source: &OpenSource,
        progress: ProgressSink<'_>,
    ) -> Result<ScriptedPages, DocumentLoadError> {
        let OpenSource::Path(path) = source else {
            let message = "in-memory sources are not scripted";
            return Err(DocumentLoadError::Backend(message.into()));
        };
        let locator = path.to_string_lossy().into_owned();

        for loaded in 1..=4 {
            progress(LoadProgress {
                loaded,
                total: 4,
            });
            yield_now().await;
        }

        let Some(pages) = self.books.get(&locator).cloned() else {
            let message = format!("cannot decode {locator}");
            return Err(DocumentLoadError::Backend(message));
        };

        Ok(ScriptedPages {
            pages,
            script: Rc::clone(&self.script),
        })
    }
}

pub struct ScriptedPages {
    pages: Vec<PageGeometry>,
    script: Rc<Script>,
}

#[async_trait(?Send)]
impl PageSource for ScriptedPages {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_geometry(&self, page_index: u32) -> Result<PageGeometry, PageError> {
        let calls = &self.script.geometry_calls;
        calls.set(calls.get() + 1);
        for _ in 0..self.script.geometry_yields.get() {
            yield_now().await;
        }
        self.pages
            .get(page_index as usize)
            .copied()
            .ok_or(PageError::OutOfRange {
                page: page_index,
                page_count: self.page_count(),
            })
    }

    async fn render_page(
        &self,
        request: RenderRequest,
        cancel: CancellationToken,
    ) -> Result<RgbaImage, PageError> {
        let page = request.page_index;
        let geometry = self.page_geometry(page).await?;
        let yields = self.script.render_yields_for(page);

        for _ in 0..yields {
            if cancel.is_cancelled() {
                return Err(PageError::Cancelled { page });
            }
            yield_now().await;
        }

        self.script.rendered.borrow_mut().push(page);
        let (width, height) = request.pixel_size(geometry);
        Ok(RgbaImage::new(width, height))
    }
}
