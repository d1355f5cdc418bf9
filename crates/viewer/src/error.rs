use folio_viewer_core::ParamsError;

/// Errors surfaced to the host by [`crate::BookViewer`].
///
/// Per-page failures never show up here: pairing degrades to a single page
/// and a failed render keeps the previous frame.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The document could not be opened. Carries the provider's message.
    #[error("{0}")]
    Load(String),
    #[error("no document is loaded")]
    NotLoaded,
    #[error(transparent)]
    Params(#[from] ParamsError),
}
