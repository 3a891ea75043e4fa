//! Typesetting translated text over the block it replaces.

mod wrap;

pub use wrap::{char_cells, fw_fill, fw_wrap, str_cells};

use std::path::Path;
use std::sync::Arc;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::draw_text_mut;

use crate::error::{Error, Result};
use crate::layout::PixelBox;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Extra pixels between lines on top of the font's own line height
const LINE_SPACING_PX: f32 = 4.0;

/// Number of cells per line for a block `block_width_px` wide.
///
/// A narrow character is taken to be half the font size wide; one cell is
/// kept free as margin. Never less than 2.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn wrap_width(block_width_px: u32, font_size: f32) -> usize {
    let cell_px = (font_size / 2.0).max(f32::EPSILON);
    let cells = (block_width_px as f32 / cell_px).floor() as usize;
    cells.saturating_sub(1).max(2)
}

/// Draws wrapped lines of text onto a canvas
pub trait TextPainter: Send + Sync {
    /// Paint `lines` in black, top to bottom, starting at the top-left corner.
    fn paint(&self, canvas: &mut RgbImage, lines: &[String]);
}

/// [`TextPainter`] rasterizing glyphs of an outline font
pub struct GlyphPainter {
    font: FontVec,
    scale: PxScale,
}

impl GlyphPainter {
    pub fn from_bytes(data: Vec<u8>, font_size: f32) -> Result<Self> {
        let font = FontVec::try_from_vec(data).map_err(|e| Error::FontLoad {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            font,
            scale: PxScale::from(font_size),
        })
    }

    /// Load a TrueType/OpenType font file.
    pub fn from_file(path: impl AsRef<Path>, font_size: f32) -> Result<Self> {
        let path = path.as_ref();
        let font_err = |reason: String| Error::FontLoad {
            path: path.display().to_string(),
            reason,
        };

        let data = std::fs::read(path).map_err(|e| font_err(e.to_string()))?;
        let font = FontVec::try_from_vec(data).map_err(|e| font_err(e.to_string()))?;
        Ok(Self {
            font,
            scale: PxScale::from(font_size),
        })
    }

    /// Vertical advance from one line to the next
    pub fn line_height(&self) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        scaled.height() + scaled.line_gap() + LINE_SPACING_PX
    }
}

impl TextPainter for GlyphPainter {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn paint(&self, canvas: &mut RgbImage, lines: &[String]) {
        let advance = self.line_height();
        for (i, line) in lines.iter().enumerate() {
            let y = (i as f32 * advance).round() as i32;
            if y >= i32::try_from(canvas.height()).unwrap_or(i32::MAX) {
                break;
            }
            draw_text_mut(canvas, BLACK, 0, y, self.scale, &self.font, line);
        }
    }
}

/// Replaces a block's pixels with wrapped translated text
#[derive(Clone)]
pub struct TextRenderer {
    painter: Arc<dyn TextPainter>,
    font_size: f32,
}

impl TextRenderer {
    pub fn new(painter: Arc<dyn TextPainter>, font_size: f32) -> Self {
        Self { painter, font_size }
    }

    pub const fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Lines the text is broken into for a block of this width.
    pub fn layout_lines(&self, text: &str, block_width_px: u32) -> Vec<String> {
        fw_wrap(text, wrap_width(block_width_px, self.font_size))
    }

    /// A white block-sized image carrying the wrapped text.
    ///
    /// Text that does not fit vertically is cut off at the block's bottom edge.
    pub fn render_block(&self, text: &str, bbox: PixelBox) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(bbox.width(), bbox.height(), WHITE);
        let lines = self.layout_lines(text, bbox.width());
        self.painter.paint(&mut canvas, &lines);
        canvas
    }

    /// Paint `text` over `bbox` on `page`; pixels outside the box are untouched.
    pub fn overlay(&self, page: &mut RgbImage, text: &str, bbox: PixelBox) {
        let block = self.render_block(text, bbox);
        imageops::replace(page, &block, i64::from(bbox.x0), i64::from(bbox.y0));
    }
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("font_size", &self.font_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the lines it gets and marks one dark pixel per line.
    #[derive(Default)]
    struct RecordingPainter {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl TextPainter for RecordingPainter {
        fn paint(&self, canvas: &mut RgbImage, lines: &[String]) {
            for (i, _) in lines.iter().enumerate() {
                let y = u32::try_from(i).unwrap();
                if y < canvas.height() {
                    canvas.put_pixel(0, y, BLACK);
                }
            }
            self.calls.lock().unwrap().push(lines.to_vec());
        }
    }

    #[test]
    fn test_wrap_width() {
        // 360 px / 18 px per cell = 20, minus one cell of margin
        assert_eq!(wrap_width(360, 36.0), 19);
        assert_eq!(wrap_width(10, 36.0), 2);
        assert_eq!(wrap_width(0, 36.0), 2);
    }

    #[test]
    fn test_render_block_wraps_to_block_width() {
        let painter = Arc::new(RecordingPainter::default());
        let renderer = TextRenderer::new(painter.clone(), 36.0);
        let bbox = PixelBox::new(0, 0, 126, 200).unwrap();

        // 126 px -> 7 cells -> 6 after margin -> 3 wide characters per line
        let block = renderer.render_block("あいうえおか", bbox);
        assert_eq!(block.dimensions(), (126, 200));

        let calls = painter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["あいう", "えおか"]);
    }

    #[test]
    fn test_overlay_only_touches_the_block() {
        let painter = Arc::new(RecordingPainter::default());
        let renderer = TextRenderer::new(painter, 36.0);
        let mut page = RgbImage::from_pixel(100, 100, Rgb([200, 10, 10]));
        let bbox = PixelBox::new(20, 30, 60, 70).unwrap();

        renderer.overlay(&mut page, "テスト", bbox);

        // Outside the box
        assert_eq!(*page.get_pixel(19, 30), Rgb([200, 10, 10]));
        assert_eq!(*page.get_pixel(60, 50), Rgb([200, 10, 10]));
        assert_eq!(*page.get_pixel(50, 70), Rgb([200, 10, 10]));
        // Inside: white background with the painted text
        assert_eq!(*page.get_pixel(20, 30), BLACK);
        assert_eq!(*page.get_pixel(59, 69), WHITE);
    }

    #[test]
    fn test_missing_font_is_an_error() {
        let result = GlyphPainter::from_file("/nonexistent/font.otf", 36.0);
        assert!(matches!(result, Err(Error::FontLoad { .. })));

        let result = GlyphPainter::from_bytes(b"not a font".to_vec(), 36.0);
        assert!(matches!(result, Err(Error::FontLoad { .. })));
    }

    #[test]
    fn test_glyph_painter_draws_text() {
        // Any system font will do for Latin glyphs
        let candidates = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        ];
        let Some(path) = candidates.iter().find(|p| Path::new(p).exists()) else {
            return;
        };

        let painter = GlyphPainter::from_file(path, 24.0).unwrap();
        assert!(painter.line_height() > 24.0);

        let mut canvas = RgbImage::from_pixel(200, 80, WHITE);
        painter.paint(&mut canvas, &["Hello".to_string(), "world".to_string()]);
        assert!(canvas.pixels().any(|p| p.0[0] < 128));
    }
}
