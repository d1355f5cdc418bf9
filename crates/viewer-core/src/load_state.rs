//! Document load lifecycle.

use serde::{Deserialize, Serialize};

/// Where the current document load stands.
///
/// A load starts at `Loading { progress: 0.0 }` and leaves that state exactly
/// once, either to `Loaded` or to `Failed`. Progress only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Loading { progress: f32 },
    Loaded { page_count: u32 },
    Failed { message: String },
}

impl Default for LoadState {
    fn default() -> Self {
        Self::Loading { progress: 0.0 }
    }
}

impl LoadState {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> Option<f32> {
        match self {
            Self::Loading { progress } => Some(*progress),
            _ => None,
        }
    }

    pub fn page_count(&self) -> Option<u32> {
        match self {
            Self::Loaded { page_count } => Some(*page_count),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Records `loaded` of `total` bytes.
    ///
    /// Ignored once the load has settled, when the total is unknown, and when
    /// it would move progress backwards. Returns whether the state changed.
    pub fn report_progress(&mut self, loaded: u64, total: u64) -> bool {
        let Self::Loading { progress } = self else {
            return false;
        };
        if total == 0 {
            return false;
        }

        let next = (loaded as f64 / total as f64).clamp(0.0, 1.0) as f32;
        if next <= *progress {
            return false;
        }

        *progress = next;
        true
    }

    /// Settles the load successfully. Returns false if it had already settled.
    pub fn finish(&mut self, page_count: u32) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = Self::Loaded { page_count };
        true
    }

    /// Settles the load with an error. Returns false if it had already settled.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = Self::Failed {
            message: message.into(),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotonic_and_clamped() {
        let mut state = LoadState::loading();

        assert!(state.report_progress(50, 100));
        assert!(!state.report_progress(25, 100));
        assert_eq!(state.progress(), Some(0.5));

        assert!(state.report_progress(500, 100));
        assert_eq!(state.progress(), Some(1.0));
    }

    #[test]
    fn unknown_total_is_ignored() {
        let mut state = LoadState::loading();
        assert!(!state.report_progress(10, 0));
        assert_eq!(state.progress(), Some(0.0));
    }

    #[test]
    fn settles_exactly_once() {
        let mut state = LoadState::loading();
        assert!(state.finish(12));
        assert!(!state.fail("late failure"));
        assert!(!state.finish(3));
        assert_eq!(state.page_count(), Some(12));

        let mut failed = LoadState::loading();
        assert!(failed.fail("Invalid PDF structure"));
        assert!(!failed.report_progress(1, 1));
        assert_eq!(failed.progress(), None);
        assert_eq!(failed.error(), Some("Invalid PDF structure"));
    }
}
