//! One-page output documents built from page images.
//!
//! Translated pages are laid out as two panels (original | translated),
//! pass-through pages as the original alone. Both are scaled to a common
//! height and embedded as a single JPEG image filling a one-page PDF.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::config::RenderConfig;
use crate::error::{Error, Result};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Builds single-page PDFs from rendered page images
#[derive(Debug, Clone)]
pub struct PageComposer {
    pub page_height_px: u32,
    pub panel_gap_px: u32,
    pub output_dpi: u32,
    pub jpeg_quality: u8,
}

impl PageComposer {
    pub const fn new(config: &RenderConfig) -> Self {
        Self {
            page_height_px: config.page_height_px,
            panel_gap_px: config.panel_gap_px,
            output_dpi: config.output_dpi,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Original and translated page side by side.
    pub fn compose_translated(
        &self,
        page_num: usize,
        original: &RgbImage,
        translated: &RgbImage,
    ) -> Result<Vec<u8>> {
        let canvas = side_by_side(original, translated, self.page_height_px, self.panel_gap_px);
        self.image_page(page_num, &canvas)
    }

    /// Original page only, scaled to the normalized height.
    pub fn compose_pass_through(&self, page_num: usize, original: &RgbImage) -> Result<Vec<u8>> {
        let resized = fit_height(original, self.page_height_px);
        self.image_page(page_num, &resized)
    }

    /// Wrap an image into a one-page PDF sized to the image at `output_dpi`.
    pub fn image_page(&self, page_num: usize, image: &RgbImage) -> Result<Vec<u8>> {
        let compose_err = |reason: String| Error::PdfCompose { page: page_num, reason };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| compose_err(format!("Failed to encode JPEG: {e}")))?;

        let (width_pt, height_pt) = px_to_points(image.width(), image.height(), self.output_dpi);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(image.width()))),
            ("Height", Object::Integer(i64::from(image.height()))),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        // Already DCT-encoded; deflating it again only costs time
        let image_id = doc.add_object(Stream::new(image_dict, jpeg).with_compression(false));

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([("Im0", Object::Reference(image_id))])),
        )]));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(height_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| compose_err(format!("Failed to encode content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width_pt),
                    Object::Real(height_pt),
                ]),
            ),
        ]));

        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| compose_err(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }
}

/// Scale an image to `height`, preserving its aspect ratio.
pub fn fit_height(image: &RgbImage, height: u32) -> RgbImage {
    if image.height() == height || image.height() == 0 {
        return image.clone();
    }
    let width = scaled_width(image.width(), image.height(), height);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Both images scaled to `height` and placed left to right with `gap` white pixels between.
pub fn side_by_side(left: &RgbImage, right: &RgbImage, height: u32, gap: u32) -> RgbImage {
    let left = fit_height(left, height);
    let right = fit_height(right, height);

    let mut canvas = RgbImage::from_pixel(left.width() + gap + right.width(), height, WHITE);
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, i64::from(left.width() + gap), 0);
    canvas
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    let scaled = (f64::from(width) * f64::from(target_height) / f64::from(height)).round();
    (scaled as u32).max(1)
}

#[allow(clippy::cast_precision_loss)]
fn px_to_points(width: u32, height: u32, dpi: u32) -> (f32, f32) {
    let factor = 72.0 / dpi as f32;
    (width as f32 * factor, height as f32 * factor)
}
