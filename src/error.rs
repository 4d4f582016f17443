//! Error kinds for report generation.
//!
//! Callers branch on the variant: a missing font is a configuration
//! problem and not retryable, a failed photo only degrades its own
//! cell, a missing output artifact means the whole build failed.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A required resource file (font) is absent or unreadable.
    /// Raised before any page is drawn.
    #[error("required resource missing: {}", .path.display())]
    ResourceMissing { path: PathBuf },

    /// A single photo could not be loaded or decoded. Never aborts
    /// the build; the cell keeps its border and label.
    #[error("photo could not be decoded: {}: {reason}", .path.display())]
    PhotoDecodeFailed { path: PathBuf, reason: String },

    /// The drawing pass finished but the output file is missing or
    /// zero-length.
    #[error("document was not created: {}", .path.display())]
    BuildIncomplete { path: PathBuf },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Error surfaced by the PDF writer.
    #[error("pdf error: {0}")]
    Pdf(String),
}
