//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Number of digits used for per-page file names.
///
/// At least three so small documents produce `000.pdf`, wider when the page
/// count needs it so lexicographic order always equals page order.
pub fn page_index_width(page_count: usize) -> usize {
    let mut digits = 1;
    let mut rest = page_count.saturating_sub(1);
    while rest >= 10 {
        rest /= 10;
        digits += 1;
    }
    digits.max(3)
}

/// File name for the output of one page, e.g. `007.pdf`.
pub fn page_file_name(page_num: usize, page_count: usize) -> String {
    let width = page_index_width(page_count);
    format!("{page_num:0width$}.pdf")
}
