use std::io;

/// Failure to open a document. Fatal to the current document view.
#[derive(Debug, thiserror::Error)]
pub enum DocumentLoadError {
    #[error("file does not exist: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Failure of a per-page operation. Recoverable: the viewer degrades to a
/// single page or keeps the previous frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PageError {
    #[error("page {page} out of range (page_count={page_count})")]
    OutOfRange { page: u32, page_count: u32 },
    #[error("cannot read geometry of page {page}: {reason}")]
    Geometry { page: u32, reason: String },
    #[error("cannot render page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("render of page {page} was cancelled")]
    Cancelled { page: u32 },
}

impl PageError {
    /// Cancellation is the expected end of a superseded render, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
