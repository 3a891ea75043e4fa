use thiserror::Error;

/// Unified error type for paper-translator-core
///
/// Everything that can abort a document translation ends up here:
/// - PDF operations (opening, rasterizing, composing, merging)
/// - Model service calls (layout, OCR, translation)
/// - Text rendering (font loading)
/// - Configuration loading
/// - General I/O
///
/// Per-block skips (short OCR output, rejected translations) are not errors.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to rasterize a PDF page
    #[error("failed to render page {page}: {reason}")]
    PdfRender { page: usize, reason: String },

    /// Failed to build a single-page output PDF
    #[error("failed to compose page {page}: {reason}")]
    PdfCompose { page: usize, reason: String },

    /// Failed to merge per-page PDFs
    #[error("failed to assemble document: {0}")]
    PdfAssemble(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Model Service Errors
    // ==========================================================================
    /// Layout segmentation failed
    #[error("layout segmentation failed: {0}")]
    Layout(String),

    /// Text recognition failed
    #[error("text recognition failed: {0}")]
    Ocr(String),

    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Every attempt allowed by the translator config failed
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // Rendering Errors
    // ==========================================================================
    /// Failed to load or parse the rendering font
    #[error("failed to load font {path}: {reason}")]
    FontLoad { path: String, reason: String },

    /// Failed to encode an image
    #[error("failed to encode image: {0}")]
    ImageEncode(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
