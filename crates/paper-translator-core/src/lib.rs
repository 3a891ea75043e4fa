//! Paper Translator Core Library
//!
//! This library provides the core functionality for translating PDF papers
//! from English into Japanese while keeping their layout:
//! - PDF rasterization, page composition and merging
//! - Layout segmentation and OCR via model services
//! - Translation via OpenAI-compatible APIs, with quality filters
//! - Full-width aware typesetting of the translated text

pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod references;
pub mod translator;
pub mod typeset;
pub mod util;

pub use config::{
    AppConfig, FilterConfig, Lang, ModelEndpoints, PassThroughStart, RenderConfig,
    TranslatorConfig, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG,
};
pub use error::{Error, Result};
pub use layout::{
    Block, BlockKind, LayoutSegmenter, OcrLine, PixelBox, RemoteLayoutSegmenter,
    RemoteTextRecognizer, TextRecognizer,
};
pub use pdf::{PageComposer, PageImage, PageRenderer, PdfDocument, MERGED_FILE_NAME};
pub use references::{is_reference_title, TranslationState};
pub use translator::{
    create_translator, BlockOutcome, BlockTranslator, OpenAiTranslator, TranslationFilter,
    Translator,
};
pub use typeset::{fw_fill, GlyphPainter, TextPainter, TextRenderer};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info};

/// How a page ends up in the output
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// Original next to its translated rendition
    Translated {
        original: RgbImage,
        translated: RgbImage,
    },
    /// Original only
    PassThrough { original: RgbImage },
}

impl PageOutcome {
    pub const fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough { .. })
    }

    /// Build the one-page output PDF.
    pub fn compose(&self, composer: &PageComposer, page_num: usize) -> Result<Vec<u8>> {
        match self {
            Self::Translated {
                original,
                translated,
            } => composer.compose_translated(page_num, original, translated),
            Self::PassThrough { original } => composer.compose_pass_through(page_num, original),
        }
    }
}

/// Per-page block counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    pub titles: usize,
    /// Blocks replaced by their translation
    pub translated: usize,
    /// Blocks with too few OCR lines
    pub skipped_short: usize,
    /// Blocks whose translation failed the quality gate
    pub rejected: usize,
}

/// Result of processing a single page
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    /// Page number (0-indexed)
    pub page_num: usize,
    pub outcome: PageOutcome,
    pub stats: PageStats,
}

/// High-level translator that combines all components
pub struct DocumentTranslator {
    segmenter: Arc<dyn LayoutSegmenter>,
    recognizer: Arc<dyn TextRecognizer>,
    blocks: BlockTranslator,
    renderer: TextRenderer,
    composer: PageComposer,
    config: AppConfig,
}

impl DocumentTranslator {
    /// Create a translator backed by the configured model servers and font.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let segmenter = Arc::new(RemoteLayoutSegmenter::new(&config.models.layout_url));
        let recognizer = Arc::new(RemoteTextRecognizer::new(&config.models.ocr_url));
        let translator = create_translator(&config.translator)?;
        let painter = Arc::new(GlyphPainter::from_file(
            &config.render.font_path,
            config.render.font_size,
        )?);

        Ok(Self::with_services(segmenter, recognizer, translator, painter, config))
    }

    /// Create with custom services
    pub fn with_services(
        segmenter: Arc<dyn LayoutSegmenter>,
        recognizer: Arc<dyn TextRecognizer>,
        translator: Arc<dyn Translator>,
        painter: Arc<dyn TextPainter>,
        config: AppConfig,
    ) -> Self {
        let blocks = BlockTranslator::new(
            translator,
            TranslationFilter::new(&config.filters),
            config.source_lang.clone(),
            config.target_lang.clone(),
        );
        let renderer = TextRenderer::new(painter, config.render.font_size);
        let composer = PageComposer::new(&config.render);

        Self {
            segmenter,
            recognizer,
            blocks,
            renderer,
            composer,
            config,
        }
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn composer(&self) -> &PageComposer {
        &self.composer
    }

    /// Process one rendered page under `state` and return the updated state.
    ///
    /// Titles are only read to find the references section; body blocks
    /// are translated and typeset in place when they pass the filters.
    pub async fn translate_page(
        &self,
        page: &PageImage,
        state: TranslationState,
    ) -> Result<(ProcessedPage, TranslationState)> {
        let mut stats = PageStats::default();
        let pass_through = |stats| ProcessedPage {
            page_num: page.index,
            outcome: PageOutcome::PassThrough {
                original: page.image.clone(),
            },
            stats,
        };

        if state.is_pass_through() {
            debug!("Page {} passes through", page.index);
            return Ok((pass_through(stats), state));
        }

        let blocks = self.segmenter.segment(&page.image).await?;
        debug!(
            "Page {}: {} blocks from {}",
            page.index,
            blocks.len(),
            self.segmenter.name()
        );

        let mut state = state;
        let mut canvas = page.image.clone();

        for block in &blocks {
            let lines = self.recognizer.recognize(&block.image).await?;

            match block.kind {
                BlockKind::Title => {
                    stats.titles += 1;
                    state = state.observe_title(&lines);
                    if state.is_pass_through()
                        && self.config.pass_through_start == PassThroughStart::CurrentPage
                    {
                        return Ok((pass_through(stats), state));
                    }
                }
                BlockKind::Other => match self.blocks.translate_lines(&lines).await? {
                    BlockOutcome::Translated(text) => {
                        self.renderer.overlay(&mut canvas, &text, block.bbox);
                        stats.translated += 1;
                    }
                    BlockOutcome::TooFewLines(count) => {
                        debug!("Skipping block at {:?}: {} OCR line(s)", block.bbox, count);
                        stats.skipped_short += 1;
                    }
                    BlockOutcome::Rejected(_) => {
                        debug!("Keeping original block at {:?}", block.bbox);
                        stats.rejected += 1;
                    }
                },
            }
        }

        let processed = ProcessedPage {
            page_num: page.index,
            outcome: PageOutcome::Translated {
                original: page.image.clone(),
                translated: canvas,
            },
            stats,
        };
        Ok((processed, state))
    }

    /// Translate all pages, writing one PDF per page into `output_dir`, and
    /// merge them into `output_dir/translated.pdf`.
    pub async fn translate_document(
        &self,
        doc: &PdfDocument,
        output_dir: &Path,
        progress_callback: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
    ) -> Result<PathBuf> {
        let total_pages = doc.page_count();
        std::fs::create_dir_all(output_dir)?;

        let renderer = PageRenderer::with_dpi(doc, self.config.render.dpi);
        let mut state = TranslationState::default();
        let mut page_files = Vec::with_capacity(total_pages);

        for page in renderer.pages() {
            let page = page?;
            let (processed, next_state) = self.translate_page(&page, state).await?;
            state = next_state;

            let stats = processed.stats;
            info!(
                "Page {}/{}: {} (translated {}, short {}, rejected {}, titles {})",
                page.index + 1,
                total_pages,
                if processed.outcome.is_pass_through() {
                    "pass-through"
                } else {
                    "translated"
                },
                stats.translated,
                stats.skipped_short,
                stats.rejected,
                stats.titles
            );

            let pdf_bytes = processed.outcome.compose(&self.composer, page.index)?;
            let path = output_dir.join(util::page_file_name(page.index, total_pages));
            std::fs::write(&path, pdf_bytes)?;
            page_files.push(path);

            if let Some(ref callback) = progress_callback {
                callback(page.index + 1, total_pages);
            }
        }

        pdf::assemble(&page_files, &output_dir.join(MERGED_FILE_NAME))
    }

    /// Translate an in-memory PDF; returns the path of the merged output.
    pub async fn translate_bytes(
        &self,
        bytes: impl Into<Vec<u8>>,
        output_dir: &Path,
        progress_callback: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
    ) -> Result<PathBuf> {
        let doc = PdfDocument::from_bytes(bytes)?;
        self.translate_document(&doc, output_dir, progress_callback)
            .await
    }

    /// Translate a PDF file; returns the path of the merged output.
    pub async fn translate_file(
        &self,
        path: impl AsRef<Path>,
        output_dir: &Path,
        progress_callback: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
    ) -> Result<PathBuf> {
        let doc = PdfDocument::from_file(path)?;
        info!(
            "Translating '{}' ({} pages)",
            doc.title().unwrap_or("untitled"),
            doc.page_count()
        );
        self.translate_document(&doc, output_dir, progress_callback)
            .await
    }
}

impl std::fmt::Debug for DocumentTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTranslator")
            .field("segmenter", &self.segmenter.name())
            .field("recognizer", &self.recognizer.name())
            .field("renderer", &self.renderer)
            .field("composer", &self.composer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.source_lang.as_str(), "en");
        assert_eq!(config.target_lang.as_str(), "ja");
    }

    #[test]
    fn test_missing_font_fails_construction() {
        let mut config = AppConfig::default();
        config.render.font_path = PathBuf::from("/nonexistent/font.otf");
        assert!(matches!(
            DocumentTranslator::from_config(config),
            Err(Error::FontLoad { .. })
        ));
    }
}
