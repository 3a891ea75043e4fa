//! Detection of the references section.
//!
//! Bibliographies should come out untouched, so once a page carries a
//! "References" title the document switches to pass-through for good.

use tracing::info;

use crate::layout::OcrLine;

/// Titles that open the bibliography, compared case-insensitively
const REFERENCE_TITLES: [&str; 2] = ["references", "reference"];

/// Document-level translation state.
///
/// Starts as [`TranslationState::Translating`]; the only transition is to
/// [`TranslationState::PassThrough`], which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationState {
    #[default]
    Translating,
    PassThrough,
}

impl TranslationState {
    pub const fn is_pass_through(self) -> bool {
        matches!(self, Self::PassThrough)
    }

    /// Feed the OCR output of a title block.
    ///
    /// Only the first line is looked at. A title without lines never matches.
    #[must_use]
    pub fn observe_title(self, lines: &[OcrLine]) -> Self {
        match self {
            Self::PassThrough => Self::PassThrough,
            Self::Translating => {
                let Some(first) = lines.first() else {
                    return self;
                };
                if is_reference_title(&first.text) {
                    info!("Reached references section (title '{}')", first.text.trim());
                    Self::PassThrough
                } else {
                    Self::Translating
                }
            }
        }
    }
}

/// True when `title` is exactly "References" or "Reference", any case.
pub fn is_reference_title(title: &str) -> bool {
    let title = title.trim();
    REFERENCE_TITLES
        .iter()
        .any(|candidate| title.eq_ignore_ascii_case(candidate))
}
