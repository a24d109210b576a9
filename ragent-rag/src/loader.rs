//! Document text extraction.
//!
//! [`DocumentLoader`] is the seam between the pipeline and whatever turns a
//! file into text. [`PdfLoader`] (feature `pdf`) extracts PDFs with
//! `pdf-extract` on a blocking thread.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Turns a document on disk into plain text.
///
/// Page boundaries are not preserved; the returned text is every page
/// concatenated in order.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the text of the document at `path`.
    ///
    /// # Errors
    ///
    /// - [`RagError::FileNotFound`](crate::RagError::FileNotFound) if `path` does not exist
    /// - [`RagError::UnsupportedFormat`](crate::RagError::UnsupportedFormat) if it can not be parsed
    /// - [`RagError::NoContentExtracted`](crate::RagError::NoContentExtracted) if it holds no text
    async fn load(&self, path: &Path) -> Result<String>;
}

/// Collapse the whitespace noise PDF extraction tends to leave behind: trailing
/// spaces on every line and long runs of blank lines.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;

#[cfg(feature = "pdf")]
mod pdf {
    use std::path::Path;

    use async_trait::async_trait;
    use tracing::{debug, error};

    use super::{DocumentLoader, normalize_text};
    use crate::error::{RagError, Result};

    const PDF_MAGIC: &[u8] = b"%PDF-";

    /// A [`DocumentLoader`] for PDF files.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PdfLoader;

    impl PdfLoader {
        /// Create a new PDF loader.
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl DocumentLoader for PdfLoader {
        async fn load(&self, path: &Path) -> Result<String> {
            let path_str = path.display().to_string();
            let unsupported = |reason: String| {
                error!(path = %path_str, %reason, "unsupported document");
                RagError::UnsupportedFormat { path: path_str.clone(), reason }
            };

            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    error!(path = %path_str, "document not found");
                    return Err(RagError::FileNotFound { path: path_str.clone() });
                }
                Err(e) => return Err(unsupported(format!("failed to read file: {e}"))),
            };

            if !bytes.starts_with(PDF_MAGIC) {
                return Err(unsupported("missing %PDF- header".into()));
            }

            // pdf-extract is synchronous and may panic on malformed input; a
            // panic surfaces here as a join error.
            let raw =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| unsupported(format!("extractor aborted: {e}")))?
                    .map_err(|e| unsupported(format!("PDF extraction failed: {e}")))?;

            let text = normalize_text(&raw);
            if text.is_empty() {
                error!(path = %path_str, "no text extracted");
                return Err(RagError::NoContentExtracted { source_id: path_str });
            }

            debug!(path = %path_str, chars = text.chars().count(), "extracted document text");
            Ok(text)
        }
    }
}
