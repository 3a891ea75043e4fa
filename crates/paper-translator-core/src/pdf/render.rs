use image::RgbImage;
use mupdf::{Colorspace, Matrix};

use crate::error::{Error, Result};
use super::document::PdfDocument;

/// Rasterization resolution used by the layout and OCR models
pub const DEFAULT_DPI: u32 = 300;

/// Resolution of PDF user space
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// A rasterized page and its position in the document
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Page number (0-indexed)
    pub index: usize,
    pub image: RgbImage,
}

/// Page rasterizer for PDF documents
pub struct PageRenderer<'a> {
    /// The PDF document to render
    pub doc: &'a PdfDocument,
    /// Target resolution
    pub dpi: u32,
}

impl<'a> PageRenderer<'a> {
    /// Create a renderer at 300 DPI
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            dpi: DEFAULT_DPI,
        }
    }

    pub const fn with_dpi(doc: &'a PdfDocument, dpi: u32) -> Self {
        Self { doc, dpi }
    }

    #[allow(clippy::cast_precision_loss)]
    fn scale(&self) -> f32 {
        self.dpi as f32 / PDF_POINTS_PER_INCH
    }

    /// Render one page to an RGB image buffer
    pub fn render_page(&self, page_num: usize) -> Result<RgbImage> {
        let total = self.doc.page_count();
        if page_num >= total {
            return Err(Error::PdfInvalidPage { page: page_num, total });
        }
        let page_index = i32::try_from(page_num)
            .map_err(|_| Error::PdfInvalidPage { page: page_num, total })?;

        let doc = self.doc.open_document()?;
        let page = doc.load_page(page_index).map_err(|e| Error::PdfRender {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

        let scale = self.scale();
        let matrix = Matrix::new_scale(scale, scale);

        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to render: {e}"),
            })?;

        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        let n = pixmap.n() as usize;
        let mut rgb_pixels = Vec::with_capacity((img_width * img_height * 3) as usize);

        for chunk in pixels.chunks(n) {
            match n {
                3 => rgb_pixels.extend_from_slice(chunk),
                // Premultiplied alpha: flatten onto white
                4 => rgb_pixels.extend(chunk[..3].iter().map(|&c| over_white(c, chunk[3]))),
                1 => rgb_pixels.extend_from_slice(&[chunk[0], chunk[0], chunk[0]]),
                2 => {
                    let gray = over_white(chunk[0], chunk[1]);
                    rgb_pixels.extend_from_slice(&[gray, gray, gray]);
                }
                _ => {
                    return Err(Error::PdfRender {
                        page: page_num,
                        reason: format!("Unexpected pixel format with {n} components"),
                    });
                }
            }
        }

        RgbImage::from_raw(img_width, img_height, rgb_pixels).ok_or_else(|| Error::PdfRender {
            page: page_num,
            reason: "Failed to create image buffer".to_string(),
        })
    }

    /// Lazily render every page in document order.
    ///
    /// The iterator is single-pass: create a new one to render again.
    pub const fn pages(self) -> PageImages<'a> {
        PageImages {
            renderer: self,
            next: 0,
        }
    }
}

/// Composite a premultiplied channel value over a white background.
const fn over_white(value: u8, alpha: u8) -> u8 {
    value.saturating_add(255 - alpha)
}

/// Ordered, single-pass sequence of rendered pages
pub struct PageImages<'a> {
    renderer: PageRenderer<'a>,
    next: usize,
}

impl Iterator for PageImages<'_> {
    type Item = Result<PageImage>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        if index >= self.renderer.doc.page_count() {
            return None;
        }
        self.next += 1;
        Some(
            self.renderer
                .render_page(index)
                .map(|image| PageImage { index, image }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.renderer.doc.page_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PageImages<'_> {}
