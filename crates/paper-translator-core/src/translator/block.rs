use std::sync::Arc;

use tracing::debug;

use super::filter::{TranslationFilter, foreign_ratio, normalize_lines};
use super::traits::Translator;
use crate::config::Lang;
use crate::error::Result;
use crate::layout::OcrLine;

/// What happened to one body block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    /// Text to render over the block
    Translated(String),
    /// Not enough OCR lines to be worth translating
    TooFewLines(usize),
    /// Output failed the quality gate; the block stays as it was
    Rejected(String),
}

/// Turns the OCR lines of a block into Japanese text, or declines to.
pub struct BlockTranslator {
    translator: Arc<dyn Translator>,
    filter: TranslationFilter,
    source: Lang,
    target: Lang,
}

impl BlockTranslator {
    pub const fn new(
        translator: Arc<dyn Translator>,
        filter: TranslationFilter,
        source: Lang,
        target: Lang,
    ) -> Self {
        Self {
            translator,
            filter,
            source,
            target,
        }
    }

    pub const fn filter(&self) -> &TranslationFilter {
        &self.filter
    }

    pub async fn translate_lines(&self, lines: &[OcrLine]) -> Result<BlockOutcome> {
        if !self.filter.has_enough_lines(lines.len()) {
            return Ok(BlockOutcome::TooFewLines(lines.len()));
        }

        let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
        let text = normalize_lines(&texts);
        let translated = self.translate_text(&text).await?;

        if self.filter.passes_quality_gate(&translated) {
            Ok(BlockOutcome::Translated(translated))
        } else {
            debug!(
                "Rejected translation ({:.0}% non-Japanese): {}",
                foreign_ratio(&translated).unwrap_or(1.0) * 100.0,
                translated
            );
            Ok(BlockOutcome::Rejected(translated))
        }
    }

    /// Translate chunk by chunk and join the surviving outputs.
    pub async fn translate_text(&self, text: &str) -> Result<String> {
        let mut translated = String::new();
        for chunk in self.filter.chunks(text) {
            let output = self
                .translator
                .translate(chunk, &self.source, &self.target)
                .await?;

            if self.filter.is_boilerplate(&output) {
                debug!("Dropping boilerplate chunk translation: {}", output);
                continue;
            }
            translated.push_str(&output);
        }
        Ok(translated)
    }
}
