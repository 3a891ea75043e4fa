//! Page layout and text recognition boundaries.
//!
//! Both are model-backed services consumed through traits so the page loop
//! can run against a model server, or against test doubles.

mod remote;

pub use remote::{RemoteLayoutSegmenter, RemoteTextRecognizer};

use async_trait::async_trait;
use image::{RgbImage, imageops};

use crate::error::Result;

/// Axis-aligned block bounds in page pixels, `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelBox {
    /// Create a box, or `None` if it is empty.
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Option<Self> {
        if x0 < x1 && y0 < y1 {
            Some(Self { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// Build a box from model coordinates, clamped to a `width` x `height` page.
    ///
    /// Returns `None` when nothing of the box is left inside the page.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamped(coords: [f64; 4], width: u32, height: u32) -> Option<Self> {
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, f64::from(max)) as u32;
        let [x0, y0, x1, y1] = coords;
        Self::new(
            clamp(x0.min(x1), width),
            clamp(y0.min(y1), height),
            clamp(x0.max(x1), width),
            clamp(y0.max(y1), height),
        )
    }

    pub const fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub const fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// Copy this region out of a page image.
    pub fn crop(&self, page: &RgbImage) -> RgbImage {
        imageops::crop_imm(page, self.x0, self.y0, self.width(), self.height()).to_image()
    }
}

/// Block type as far as the pipeline cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    /// Body text, figures, tables, lists, ...
    Other,
}

impl BlockKind {
    /// Map a layout model label (`"title"`, `"text"`, `"figure"`, ...).
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("title") {
            Self::Title
        } else {
            Self::Other
        }
    }
}

/// A typed region of a page
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub bbox: PixelBox,
    /// Cropped block pixels
    pub image: RgbImage,
}

impl Block {
    /// Cut a block out of `page`.
    pub fn from_page(page: &RgbImage, kind: BlockKind, bbox: PixelBox) -> Self {
        Self {
            kind,
            bbox,
            image: bbox.crop(page),
        }
    }
}

/// One recognized line of text
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

/// Partitions a page image into typed blocks in reading order
#[async_trait]
pub trait LayoutSegmenter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn segment(&self, page: &RgbImage) -> Result<Vec<Block>>;
}

/// Recognizes the text lines of a block image, top to bottom
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(&self, image: &RgbImage) -> Result<Vec<OcrLine>>;
}
