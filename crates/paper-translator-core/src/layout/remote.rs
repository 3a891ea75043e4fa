//! JSON-over-HTTP clients for a layout/OCR model server.
//!
//! Request body for both endpoints: `{"image": "<base64 PNG>"}`.
//!
//! Layout response: `{"blocks": [{"type": "title", "bbox": [x0, y0, x1, y1]}, ...]}`
//! OCR response: `{"lines": [{"text": "...", "confidence": 0.98}, ...]}`

use std::io::Cursor;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use image::{ImageFormat, RgbImage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Block, BlockKind, LayoutSegmenter, OcrLine, PixelBox, TextRecognizer};
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: String,
}

#[derive(Debug, Deserialize)]
struct LayoutResponse {
    blocks: Vec<LayoutBlock>,
}

#[derive(Debug, Deserialize)]
struct LayoutBlock {
    #[serde(rename = "type")]
    label: String,
    bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    lines: Vec<OcrResponseLine>,
}

#[derive(Debug, Deserialize)]
struct OcrResponseLine {
    text: String,
    #[serde(default)]
    confidence: f32,
}

fn encode_png(image: &RgbImage) -> std::result::Result<String, image::ImageError> {
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(png.into_inner()))
}

/// POST an image and decode the JSON reply; errors are mapped by `wrap`.
async fn post_image<T: for<'de> Deserialize<'de>>(
    client: &Client,
    url: &str,
    image: &RgbImage,
    wrap: fn(String) -> Error,
) -> Result<T> {
    let request = ImageRequest {
        image: encode_png(image).map_err(|e| Error::ImageEncode(e.to_string()))?,
    };

    let response = client
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| wrap(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(wrap(format!("HTTP {status}: {body}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| wrap(format!("invalid response from {url}: {e}")))
}

/// Layout segmentation through a model server
pub struct RemoteLayoutSegmenter {
    client: Client,
    pub url: String,
}

impl RemoteLayoutSegmenter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LayoutSegmenter for RemoteLayoutSegmenter {
    fn name(&self) -> &'static str {
        "remote-layout"
    }

    async fn segment(&self, page: &RgbImage) -> Result<Vec<Block>> {
        let response: LayoutResponse =
            post_image(&self.client, &self.url, page, Error::Layout).await?;

        let (width, height) = page.dimensions();
        let mut blocks = Vec::with_capacity(response.blocks.len());
        for raw in response.blocks {
            match PixelBox::clamped(raw.bbox, width, height) {
                Some(bbox) => {
                    blocks.push(Block::from_page(page, BlockKind::from_label(&raw.label), bbox));
                }
                None => debug!("Dropping empty {} block at {:?}", raw.label, raw.bbox),
            }
        }
        Ok(blocks)
    }
}

/// Text recognition through a model server
pub struct RemoteTextRecognizer {
    client: Client,
    pub url: String,
}

impl RemoteTextRecognizer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for RemoteTextRecognizer {
    fn name(&self) -> &'static str {
        "remote-ocr"
    }

    async fn recognize(&self, image: &RgbImage) -> Result<Vec<OcrLine>> {
        let response: OcrResponse = post_image(&self.client, &self.url, image, Error::Ocr).await?;
        Ok(response
            .lines
            .into_iter()
            .map(|line| OcrLine {
                text: line.text,
                confidence: line.confidence,
            })
            .collect())
    }
}
