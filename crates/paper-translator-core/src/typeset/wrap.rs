//! Line filling that knows full-width characters take two cells.
//!
//! Latin words stay together unless a single word is wider than a line;
//! wide (CJK) characters may break anywhere.

use unicode_width::UnicodeWidthChar;

/// Cells taken by one character: 2 for East Asian wide/fullwidth, else 1.
pub fn char_cells(c: char) -> usize {
    if c.width() == Some(2) { 2 } else { 1 }
}

/// Cells taken by a string.
pub fn str_cells(s: &str) -> usize {
    s.chars().map(char_cells).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Space(&'a str),
    Newline,
    /// Run of narrow, non-space characters
    Word(&'a str),
    /// A single wide character
    Wide(&'a str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '\n' {
            tokens.push(Token::Newline);
            continue;
        }
        if char_cells(c) == 2 {
            tokens.push(Token::Wide(&text[start..start + c.len_utf8()]));
            continue;
        }

        let is_space = c.is_whitespace();
        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            let same_kind = next != '\n'
                && char_cells(next) == 1
                && next.is_whitespace() == is_space;
            if !same_kind {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }

        let run = &text[start..end];
        tokens.push(if is_space { Token::Space(run) } else { Token::Word(run) });
    }

    tokens
}

struct LineBuilder {
    width: usize,
    lines: Vec<String>,
    current: String,
    cells: usize,
}

impl LineBuilder {
    const fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: String::new(),
            cells: 0,
        }
    }

    const fn fits(&self, cells: usize) -> bool {
        self.cells + cells <= self.width
    }

    fn push(&mut self, s: &str, cells: usize) {
        self.current.push_str(s);
        self.cells += cells;
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.lines.push(line.trim_end().to_string());
        self.cells = 0;
    }

    fn push_breakable(&mut self, word: &str) {
        for c in word.chars() {
            let cells = char_cells(c);
            if !self.fits(cells) {
                self.break_line();
            }
            self.current.push(c);
            self.cells += cells;
        }
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Wrap `text` into lines of at most `width` cells.
///
/// `width` is raised to 2 so a single wide character always fits.
pub fn fw_wrap(text: &str, width: usize) -> Vec<String> {
    let mut builder = LineBuilder::new(width.max(2));

    for token in tokenize(text) {
        match token {
            Token::Newline => builder.break_line(),
            Token::Space(space) => {
                // Spaces never start a line
                if builder.current.is_empty() {
                    continue;
                }
                let cells = str_cells(space);
                if builder.fits(cells) {
                    builder.push(space, cells);
                } else {
                    builder.break_line();
                }
            }
            Token::Word(word) | Token::Wide(word) => {
                let cells = str_cells(word);
                if builder.fits(cells) {
                    builder.push(word, cells);
                } else if cells <= builder.width {
                    builder.break_line();
                    builder.push(word, cells);
                } else {
                    builder.push_breakable(word);
                }
            }
        }
    }

    builder.finish()
}

/// [`fw_wrap`] joined with newlines.
pub fn fw_fill(text: &str, width: usize) -> String {
    fw_wrap(text, width).join("\n")
}
