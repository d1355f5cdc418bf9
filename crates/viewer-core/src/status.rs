//! What the shell shows around the pages: indicator text and load status.

use crate::load_state::LoadState;
use crate::navigation::NavigationState;
use serde::Serialize;

pub const LOADING_MESSAGE: &str = "Loading document...";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading document";

/// Page indicator shown under the pages, 1-based.
pub fn page_label(state: NavigationState, page_count: u32) -> String {
    let first = state.page_index + 1;

    match state.right_page() {
        Some(right) => format!("Pages {first} - {} / {page_count}", right + 1),
        None => format!("Page {first} / {page_count}"),
    }
}

/// Snapshot of everything the shell renders for the current document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerStatus {
    pub title: String,
    /// Locator the download control links to.
    pub download: String,
    pub load: LoadState,
    pub navigation: Option<NavigationState>,
    pub label: Option<String>,
}

impl ViewerStatus {
    pub fn new(title: impl Into<String>, download: impl Into<String>, load: LoadState) -> Self {
        Self {
            title: title.into(),
            download: download.into(),
            load,
            navigation: None,
            label: None,
        }
    }

    pub fn with_navigation(mut self, state: NavigationState, page_count: u32) -> Self {
        self.label = Some(page_label(state, page_count));
        self.navigation = Some(state);
        self
    }

    /// Whether the right-hand surface should be visible.
    pub fn show_right(&self) -> bool {
        self.navigation.is_some_and(|state| state.pair_with_next)
    }

    /// Loading bar fill in percent, while a load is in progress.
    pub fn progress_percent(&self) -> Option<u8> {
        self.load
            .progress()
            .map(|progress| (progress * 100.0).round() as u8)
    }

    /// One-line summary of the load, for hosts without a progress bar.
    pub fn status_line(&self) -> String {
        match &self.load {
            LoadState::Loading { .. } => {
                let percent = self.progress_percent().unwrap_or(0);
                format!("{LOADING_MESSAGE} {percent}%")
            }
            LoadState::Failed { message } => format!("{LOAD_ERROR_MESSAGE}: {message}"),
            LoadState::Loaded { .. } => self.label.clone().unwrap_or_default(),
        }
    }
}
