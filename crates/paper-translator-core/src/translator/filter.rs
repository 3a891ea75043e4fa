//! Text policies around the translation call: input normalization,
//! chunking, and rejection of bad model output.

use crate::config::FilterConfig;

/// Characters that confuse the translation model; each becomes a space.
const NOISE_CHARS: [char; 6] = ['\n', '\t', '[', ']', '/', '|'];

/// Join OCR lines with single spaces and blank out noise characters.
pub fn normalize_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .map(|c| if NOISE_CHARS.contains(&c) { ' ' } else { c })
        .collect()
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Each chunk ends right after the last `.` of its window so sentences stay
/// whole; a window without a period is cut at the limit. Concatenating the
/// chunks yields `text` again.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        let Some((window_end, _)) = rest.char_indices().nth(max_chars) else {
            // Remainder fits in one chunk
            chunks.push(rest);
            break;
        };

        let window = &rest[..window_end];
        let cut = window.rfind('.').map_or(window_end, |i| i + 1);
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail;

        if rest.is_empty() {
            break;
        }
    }

    chunks
}

/// Hiragana, Katakana, CJK Unified Ideographs and Extension A.
pub const fn is_target_script(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
    )
}

/// Share of characters outside the target script; `None` for empty text.
#[allow(clippy::cast_precision_loss)]
pub fn foreign_ratio(text: &str) -> Option<f64> {
    let (total, foreign) = text.chars().fold((0usize, 0usize), |(total, foreign), c| {
        (total + 1, foreign + usize::from(!is_target_script(c)))
    });
    (total > 0).then(|| foreign as f64 / total as f64)
}

/// Configured accept/reject decisions for one block
#[derive(Debug, Clone)]
pub struct TranslationFilter {
    min_ocr_lines: usize,
    max_chunk_chars: usize,
    rejected_prefixes: Vec<String>,
    max_foreign_ratio: f64,
}

impl TranslationFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_ocr_lines: config.min_ocr_lines,
            max_chunk_chars: config.max_chunk_chars,
            rejected_prefixes: config.rejected_prefixes.clone(),
            max_foreign_ratio: config.max_foreign_ratio,
        }
    }

    /// Blocks with too few lines (page numbers, labels) are left alone.
    pub const fn has_enough_lines(&self, line_count: usize) -> bool {
        line_count >= self.min_ocr_lines
    }

    pub fn chunks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        chunk_text(text, self.max_chunk_chars)
    }

    /// Known artifacts the model emits instead of a translation.
    pub fn is_boilerplate(&self, translated_chunk: &str) -> bool {
        self.rejected_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && translated_chunk.starts_with(prefix.as_str()))
    }

    /// False when the output is empty or mostly not Japanese (echoed input, garbage).
    pub fn passes_quality_gate(&self, translated: &str) -> bool {
        foreign_ratio(translated).is_some_and(|ratio| ratio <= self.max_foreign_ratio)
    }
}

impl Default for TranslationFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
