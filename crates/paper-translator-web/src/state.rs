use anyhow::{Context, Result};
use paper_translator_core::{AppConfig, DocumentTranslator, PdfDocument};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::debug;

/// Subdirectory of the scratch dir receiving the per-page files of a request
const PAGES_DIR: &str = "pages";

/// Global application state
pub struct AppState {
    translator: DocumentTranslator,
    /// Shared scratch directory; the lock also serializes translations
    scratch: Mutex<TempDir>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let translator =
            DocumentTranslator::from_config(config).context("Failed to create translator")?;
        Self::with_translator(translator)
    }

    pub fn with_translator(translator: DocumentTranslator) -> Result<Self> {
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        debug!("Scratch directory at {}", scratch.path().display());
        Ok(Self {
            translator,
            scratch: Mutex::new(scratch),
        })
    }

    /// Translate a document and return the merged PDF bytes.
    ///
    /// Requests queue on the scratch directory lock and run one at a time.
    pub async fn translate(&self, doc: &PdfDocument) -> paper_translator_core::Result<Vec<u8>> {
        let scratch = self.scratch.lock().await;
        let pages_dir = scratch.path().join(PAGES_DIR);

        // Leftovers of an earlier, longer document must not be merged in
        if pages_dir.exists() {
            tokio::fs::remove_dir_all(&pages_dir).await?;
        }

        let merged = self
            .translator
            .translate_document(doc, &pages_dir, None)
            .await?;
        Ok(tokio::fs::read(merged).await?)
    }

    /// Delete everything inside the scratch directory; returns the number of
    /// removed entries.
    pub async fn clear_temp_dir(&self) -> std::io::Result<usize> {
        let scratch = self.scratch.lock().await;
        let mut entries = tokio::fs::read_dir(scratch.path()).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path: PathBuf = entry.path();
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
            removed += 1;
        }

        Ok(removed)
    }

    #[cfg(test)]
    pub async fn scratch_path(&self) -> PathBuf {
        self.scratch.lock().await.path().to_path_buf()
    }
}
