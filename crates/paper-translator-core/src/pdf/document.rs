use std::path::Path;
use std::sync::Arc;

use mupdf::{Document as MuDocument, MetadataName};

use crate::error::{Error, Result};

/// Read-only input document.
///
/// Holds the raw bytes so every page can be reopened on demand; no mupdf
/// handle outlives a single call, which keeps this type `Send + Sync`.
pub struct PdfDocument {
    bytes: Arc<Vec<u8>>,
    page_count: usize,
    title: Option<String>,
}

impl PdfDocument {
    /// Open a PDF from bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;
        let page_count = usize::try_from(page_count)
            .map_err(|_| Error::PdfOpen(format!("Invalid page count {page_count}")))?;

        if page_count == 0 {
            return Err(Error::PdfOpen("Document has no pages".to_string()));
        }

        // mupdf returns an empty string when the entry is missing
        let title = doc
            .metadata(MetadataName::Title)
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            bytes: Arc::new(bytes),
            page_count,
            title,
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::PdfOpen(format!("Failed to read file {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Title from the document info dictionary, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Open a short-lived mupdf handle
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to open document: {e}")))
    }
}

impl Clone for PdfDocument {
    /// O(1): only the `Arc` around the bytes is cloned.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
            title: self.title.clone(),
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("title", &self.title)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
