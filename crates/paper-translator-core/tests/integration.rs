//! Integration tests for paper-translator-core
//!
//! These tests drive the whole page loop with scripted model services:
//! - rasterization of a generated PDF
//! - layout, OCR and translation through mock backends
//! - references detection and pass-through pages
//! - per-page output files and the merged document

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};
use paper_translator_core::pdf::merge::assemble_dir;
use paper_translator_core::translator::TranslatorInfo;
use paper_translator_core::{
    AppConfig, Block, BlockKind, DocumentTranslator, Error, Lang, LayoutSegmenter, OcrLine,
    PageComposer, PageImage, PageOutcome, PageRenderer, PassThroughStart, PdfDocument, PixelBox,
    Result, TextPainter, TextRecognizer, TranslationState, Translator, MERGED_FILE_NAME,
};

const JAPANESE: &str = "これは翻訳された本文です。";

// =============================================================================
// Mock Services
// =============================================================================

/// Returns a scripted list of blocks per call, page after page.
struct ScriptedSegmenter {
    pages: Mutex<VecDeque<Vec<(BlockKind, [f64; 4])>>>,
    calls: AtomicUsize,
    should_fail: bool,
}

impl ScriptedSegmenter {
    fn new(pages: Vec<Vec<(BlockKind, [f64; 4])>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            calls: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl LayoutSegmenter for ScriptedSegmenter {
    fn name(&self) -> &'static str {
        "scripted-layout"
    }

    async fn segment(&self, page: &RgbImage) -> Result<Vec<Block>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(Error::Layout("Mock layout failure".to_string()));
        }

        let (width, height) = page.dimensions();
        let script = self.pages.lock().unwrap().pop_front().unwrap_or_default();
        Ok(script
            .into_iter()
            .filter_map(|(kind, coords)| {
                PixelBox::clamped(coords, width, height).map(|bbox| Block::from_page(page, kind, bbox))
            })
            .collect())
    }
}

/// Answers OCR calls in order from a script.
struct ScriptedRecognizer {
    replies: Mutex<VecDeque<Vec<&'static str>>>,
}

impl ScriptedRecognizer {
    fn new(replies: Vec<Vec<&'static str>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl TextRecognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted-ocr"
    }

    async fn recognize(&self, _image: &RgbImage) -> Result<Vec<OcrLine>> {
        let lines = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Ocr("script exhausted".to_string()))?;
        Ok(lines
            .into_iter()
            .map(|text| OcrLine {
                text: text.to_string(),
                confidence: 0.95,
            })
            .collect())
    }
}

/// Translates everything into the same Japanese sentence and records its inputs.
#[derive(Default)]
struct MockTranslator {
    inputs: Mutex<Vec<String>>,
}

#[async_trait]
impl Translator for MockTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "mock",
            requires_api_key: false,
        }
    }

    async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(JAPANESE.to_string())
    }
}

/// Marks a black square in the corner instead of drawing glyphs.
struct SquarePainter;

impl TextPainter for SquarePainter {
    fn paint(&self, canvas: &mut RgbImage, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        for y in 0..4.min(canvas.height()) {
            for x in 0..4.min(canvas.width()) {
                canvas.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Build a Letter-sized PDF with one line of Helvetica text per page.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut kids = Vec::with_capacity(page_count);
    for page in 0..page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {page}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.encode().unwrap()));

        let page_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(i64::try_from(page_count).unwrap())),
    ]);
    doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Rasterize at 72 DPI so page pixels equal PDF points.
fn test_config(pass_through_start: PassThroughStart) -> AppConfig {
    let mut config = AppConfig {
        pass_through_start,
        ..Default::default()
    };
    config.render.dpi = 72;
    config
}

const TITLE_BOX: [f64; 4] = [50.0, 20.0, 300.0, 60.0];
const BODY_BOX: [f64; 4] = [50.0, 120.0, 560.0, 400.0];

fn title_and_body() -> Vec<(BlockKind, [f64; 4])> {
    vec![(BlockKind::Title, TITLE_BOX), (BlockKind::Other, BODY_BOX)]
}

struct Harness {
    segmenter: Arc<ScriptedSegmenter>,
    translator: Arc<MockTranslator>,
    pipeline: DocumentTranslator,
}

fn harness(segmenter: ScriptedSegmenter, recognizer: ScriptedRecognizer, config: AppConfig) -> Harness {
    let segmenter = Arc::new(segmenter);
    let translator = Arc::new(MockTranslator::default());
    let pipeline = DocumentTranslator::with_services(
        segmenter.clone(),
        Arc::new(recognizer),
        translator.clone(),
        Arc::new(SquarePainter),
        config,
    );
    Harness {
        segmenter,
        translator,
        pipeline,
    }
}

/// Orientation of every page of a merged output, in order.
fn landscape_pages(path: &Path) -> Vec<bool> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let width = media_box[2].as_float().unwrap();
            let height = media_box[3].as_float().unwrap();
            width > height
        })
        .collect()
}

// =============================================================================
// Page Tests
// =============================================================================

#[tokio::test]
async fn test_body_block_is_translated_in_place() {
    let h = harness(
        ScriptedSegmenter::new(vec![title_and_body()]),
        ScriptedRecognizer::new(vec![
            vec!["Introduction"],
            vec!["We study translation", "of scientific papers."],
        ]),
        test_config(PassThroughStart::NextPage),
    );

    let doc = PdfDocument::from_bytes(create_test_pdf(1)).unwrap();
    let image = PageRenderer::with_dpi(&doc, 72).render_page(0).unwrap();
    let page = PageImage { index: 0, image };

    let (processed, state) = h
        .pipeline
        .translate_page(&page, TranslationState::default())
        .await
        .unwrap();

    assert_eq!(state, TranslationState::Translating);
    assert_eq!(processed.stats.titles, 1);
    assert_eq!(processed.stats.translated, 1);
    assert_eq!(
        h.translator.inputs.lock().unwrap().as_slice(),
        ["We study translation of scientific papers."]
    );

    let PageOutcome::Translated { original, translated } = processed.outcome else {
        panic!("expected a translated page");
    };
    // The body block was replaced by the painted text
    assert_eq!(*original.get_pixel(51, 121), Rgb([255, 255, 255]));
    assert_eq!(*translated.get_pixel(51, 121), Rgb([0, 0, 0]));
    assert_eq!(*translated.get_pixel(300, 300), Rgb([255, 255, 255]));
    // The title block and the rest of the page are untouched
    assert_eq!(translated.get_pixel(100, 85), original.get_pixel(100, 85));
    assert_eq!(translated.get_pixel(10, 10), original.get_pixel(10, 10));
}

#[tokio::test]
async fn test_short_and_rejected_blocks_are_left_alone() {
    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo {
                name: "echo",
                requires_api_key: false,
            }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            Ok(text.to_string())
        }
    }

    let pipeline = DocumentTranslator::with_services(
        Arc::new(ScriptedSegmenter::new(vec![vec![
            (BlockKind::Other, [10.0, 10.0, 200.0, 40.0]),
            (BlockKind::Other, BODY_BOX),
        ]])),
        Arc::new(ScriptedRecognizer::new(vec![
            vec!["3"],
            vec!["English stays", "English."],
        ])),
        Arc::new(EchoTranslator),
        Arc::new(SquarePainter),
        test_config(PassThroughStart::NextPage),
    );

    let page = PageImage {
        index: 0,
        image: RgbImage::from_pixel(612, 792, Rgb([255, 255, 255])),
    };
    let (processed, _) = pipeline
        .translate_page(&page, TranslationState::Translating)
        .await
        .unwrap();

    assert_eq!(processed.stats.skipped_short, 1);
    assert_eq!(processed.stats.rejected, 1);
    assert_eq!(processed.stats.translated, 0);
    let PageOutcome::Translated { original, translated } = processed.outcome else {
        panic!("expected a translated page");
    };
    assert_eq!(original, translated);
}

#[tokio::test]
async fn test_pass_through_state_skips_all_services() {
    let h = harness(
        ScriptedSegmenter::new(vec![title_and_body()]),
        ScriptedRecognizer::new(vec![]),
        test_config(PassThroughStart::NextPage),
    );

    let page = PageImage {
        index: 4,
        image: RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])),
    };
    let (processed, state) = h
        .pipeline
        .translate_page(&page, TranslationState::PassThrough)
        .await
        .unwrap();

    assert!(processed.outcome.is_pass_through());
    assert_eq!(processed.page_num, 4);
    assert_eq!(state, TranslationState::PassThrough);
    assert_eq!(h.segmenter.calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Document Tests
// =============================================================================

#[tokio::test]
async fn test_translate_document_side_by_side() {
    let h = harness(
        ScriptedSegmenter::new(vec![title_and_body()]),
        ScriptedRecognizer::new(vec![
            vec!["Introduction"],
            vec!["We study translation", "of scientific papers."],
        ]),
        test_config(PassThroughStart::NextPage),
    );
    let dir = tempfile::tempdir().unwrap();

    let output = h
        .pipeline
        .translate_bytes(create_test_pdf(1), dir.path(), None)
        .await
        .unwrap();

    assert_eq!(output, dir.path().join(MERGED_FILE_NAME));
    assert!(dir.path().join("000.pdf").exists());
    assert_eq!(landscape_pages(&output), vec![true]);
}

#[tokio::test]
async fn test_references_switch_on_next_page() {
    let h = harness(
        ScriptedSegmenter::new(vec![title_and_body(), title_and_body()]),
        ScriptedRecognizer::new(vec![
            vec!["Introduction"],
            vec!["We study translation", "of scientific papers."],
            vec!["REFERENCES"],
            // Still translated: the switch applies from the next page on
            vec!["[1] A. Author. A paper.", "Journal, 2020."],
        ]),
        test_config(PassThroughStart::NextPage),
    );
    let dir = tempfile::tempdir().unwrap();

    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    let callback = Box::new(move |done: usize, total: usize| {
        seen.lock().unwrap().push((done, total));
    });

    let output = h
        .pipeline
        .translate_bytes(create_test_pdf(4), dir.path(), Some(callback))
        .await
        .unwrap();

    assert_eq!(landscape_pages(&output), vec![true, true, false, false]);
    assert_eq!(h.segmenter.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.translator.inputs.lock().unwrap().len(), 2);
    assert_eq!(
        progress.lock().unwrap().as_slice(),
        [(1, 4), (2, 4), (3, 4), (4, 4)]
    );
}

#[tokio::test]
async fn test_references_switch_on_current_page() {
    let h = harness(
        ScriptedSegmenter::new(vec![title_and_body(), title_and_body()]),
        ScriptedRecognizer::new(vec![
            vec!["Introduction"],
            vec!["We study translation", "of scientific papers."],
            vec!["References"],
        ]),
        test_config(PassThroughStart::CurrentPage),
    );
    let dir = tempfile::tempdir().unwrap();

    let output = h
        .pipeline
        .translate_bytes(create_test_pdf(3), dir.path(), None)
        .await
        .unwrap();

    assert_eq!(landscape_pages(&output), vec![true, false, false]);
    assert_eq!(h.segmenter.calls.load(Ordering::SeqCst), 2);
    // The body block after the title on page 1 was never translated
    assert_eq!(h.translator.inputs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_service_failure_aborts_without_output() {
    let h = harness(
        ScriptedSegmenter::failing(),
        ScriptedRecognizer::new(vec![]),
        test_config(PassThroughStart::NextPage),
    );
    let dir = tempfile::tempdir().unwrap();

    let result = h
        .pipeline
        .translate_bytes(create_test_pdf(2), dir.path(), None)
        .await;

    assert!(matches!(result, Err(Error::Layout(_))));
    assert!(!dir.path().join(MERGED_FILE_NAME).exists());
}

#[tokio::test]
async fn test_many_pages_get_ordered_file_names() {
    // A references title on the first page turns the whole document into pass-through
    let h = harness(
        ScriptedSegmenter::new(vec![vec![(BlockKind::Title, TITLE_BOX)]]),
        ScriptedRecognizer::new(vec![vec!["References"]]),
        test_config(PassThroughStart::CurrentPage),
    );
    let dir = tempfile::tempdir().unwrap();

    let output = h
        .pipeline
        .translate_bytes(create_test_pdf(11), dir.path(), None)
        .await
        .unwrap();

    for name in ["000.pdf", "001.pdf", "009.pdf", "010.pdf"] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
    assert_eq!(landscape_pages(&output), vec![false; 11]);
}

// =============================================================================
// Assembly Tests
// =============================================================================

#[test]
fn test_assembly_follows_file_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let composer = PageComposer::new(&AppConfig::default().render);

    // Written out of order; 010 is landscape so its position is visible
    let pages = [
        ("010.pdf", RgbImage::new(300, 100)),
        ("000.pdf", RgbImage::new(100, 300)),
        ("001.pdf", RgbImage::new(100, 300)),
    ];
    for (name, image) in &pages {
        let bytes = composer.image_page(0, image).unwrap();
        std::fs::write(dir.path().join(name), bytes).unwrap();
    }

    let output = assemble_dir(dir.path()).unwrap();
    assert_eq!(landscape_pages(&output), vec![false, false, true]);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_invalid_pdf_bytes() {
    let result = PdfDocument::from_bytes(vec![0, 1, 2, 3]);
    assert!(result.is_err(), "Should fail for invalid PDF bytes");
}

#[test]
fn test_empty_pdf_bytes() {
    let result = PdfDocument::from_bytes(vec![]);
    assert!(result.is_err(), "Should fail for empty PDF bytes");
}
