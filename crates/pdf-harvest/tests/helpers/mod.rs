//! Shared fixtures for integration tests.
//!
//! Provides generated PDFs and deterministic stand-ins for every external
//! engine so the pipeline can be exercised without Tesseract, Poppler or Pdfium.

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdf_harvest::pdf::text::PAGE_SEPARATOR;
use pdf_harvest::plugins::{OcrBackend, PageRasterizer, Plugin, TableDetector, TextExtraction, TextExtractionEngine};
use pdf_harvest::tables::RawTableResult;
use pdf_harvest::types::DocumentMetadata;
use pdf_harvest::{HarvestError, PdfPipeline, PdfPipelineBuilder, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a PDF with one page per entry, each line placed below the previous one.
pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 750 - 20 * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content stream should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("PDF should serialize");
    buffer
}

/// A PDF whose header region carries an encryption marker.
pub fn encrypted_pdf() -> Vec<u8> {
    b"%PDF-1.7\n1 0 obj\n<< /Encrypt 2 0 R /Filter /Standard >>\nendobj\n%%EOF\n".to_vec()
}

/// Write `bytes` to `name` inside a fresh temporary directory.
pub fn write_temp_pdf(bytes: &[u8], name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).expect("write PDF");
    (dir, path)
}

macro_rules! stub_plugin {
    ($ty:ty, $name:expr) => {
        impl Plugin for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> String {
                "0.0.0".to_string()
            }

            fn initialize(&self) -> Result<()> {
                Ok(())
            }

            fn shutdown(&self) -> Result<()> {
                Ok(())
            }
        }
    };
}

/// Text engine serving fixed per-page text.
pub struct StubTextEngine {
    pages: Vec<String>,
    failing_pages: Vec<u32>,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<Vec<u32>>>,
}

impl StubTextEngine {
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            failing_pages: Vec::new(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// A document of `count` pages without a text layer.
    pub fn blank(count: usize) -> Self {
        Self::new(std::iter::repeat_n("", count))
    }

    /// Fail any extraction that includes one of `pages`.
    pub fn failing_on(mut self, pages: &[u32]) -> Self {
        self.failing_pages = pages.to_vec();
        self
    }

    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            number_of_pages: self.pages.len() as u32,
            version: "1.7".to_string(),
            ..Default::default()
        }
    }
}

stub_plugin!(StubTextEngine, "stub-text");

#[async_trait]
impl TextExtractionEngine for StubTextEngine {
    async fn extract(&self, _pdf: &[u8], pages: Option<&[u32]>) -> Result<TextExtraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let selected: Vec<u32> = match pages {
            Some(pages) => pages.to_vec(),
            None => (1..=self.pages.len() as u32).collect(),
        };
        self.requested.lock().unwrap().push(selected.clone());

        if let Some(page) = selected.iter().find(|p| self.failing_pages.contains(p)) {
            return Err(HarvestError::text_extraction_failed(format!("page {} is unreadable", page)));
        }

        let text = selected
            .iter()
            .filter_map(|p| self.pages.get(*p as usize - 1))
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        Ok(TextExtraction {
            text,
            metadata: self.metadata(),
        })
    }

    async fn probe(&self, _pdf: &[u8]) -> Result<TextExtraction> {
        Ok(TextExtraction {
            text: String::new(),
            metadata: self.metadata(),
        })
    }
}

/// Rasterizer producing `page-{n}` byte strings instead of images.
#[derive(Default)]
pub struct StubRasterizer {
    pub calls: AtomicUsize,
    pub scales: Mutex<Vec<f32>>,
}

impl StubRasterizer {
    pub fn new() -> Self {
        Self::default()
    }
}

stub_plugin!(StubRasterizer, "stub-rasterizer");

#[async_trait]
impl PageRasterizer for StubRasterizer {
    async fn rasterize(&self, pdf_path: &Path, page_indices: &[u32], scale: f32) -> Result<Vec<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scales.lock().unwrap().push(scale);
        assert!(pdf_path.exists(), "rasterizer needs the PDF on disk");
        Ok(page_indices
            .iter()
            .map(|index| format!("page-{}", index + 1).into_bytes())
            .collect())
    }
}

/// OCR backend that reads the page number out of a [`StubRasterizer`] image.
pub struct StubOcrBackend {
    pages: Vec<String>,
    pub calls: AtomicUsize,
    pub languages: Mutex<Vec<Vec<String>>>,
}

impl StubOcrBackend {
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        }
    }
}

stub_plugin!(StubOcrBackend, "stub-ocr");

#[async_trait]
impl OcrBackend for StubOcrBackend {
    async fn recognize(&self, image: &[u8], languages: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(languages.to_vec());

        let page: usize = std::str::from_utf8(image)
            .ok()
            .and_then(|s| s.strip_prefix("page-"))
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| HarvestError::ocr_failed("unrecognized image"))?;
        Ok(self.pages.get(page - 1).cloned().unwrap_or_default())
    }
}

/// OCR backend that always fails.
#[derive(Default)]
pub struct FailingOcrBackend {
    pub calls: AtomicUsize,
}

stub_plugin!(FailingOcrBackend, "failing-ocr");

#[async_trait]
impl OcrBackend for FailingOcrBackend {
    async fn recognize(&self, _image: &[u8], _languages: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HarvestError::ocr_failed("engine crashed"))
    }
}

/// Table detector returning a fixed result, or an error when built with [`StubTableDetector::failing`].
pub struct StubTableDetector {
    result: Option<RawTableResult>,
    pub requested: Mutex<Vec<Option<Vec<u32>>>>,
}

impl StubTableDetector {
    pub fn new(result: RawTableResult) -> Self {
        Self {
            result: Some(result),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            requested: Mutex::new(Vec::new()),
        }
    }
}

stub_plugin!(StubTableDetector, "stub-tables");

#[async_trait]
impl TableDetector for StubTableDetector {
    async fn detect_tables(&self, _pdf_path: &Path, pages: Option<&[u32]>) -> Result<RawTableResult> {
        self.requested.lock().unwrap().push(pages.map(<[u32]>::to_vec));
        self.result
            .clone()
            .ok_or_else(|| HarvestError::table_extraction_failed("detector unavailable"))
    }
}

/// Builder with stub rasterizer, OCR and table engines around `text`.
pub fn stub_builder(text: Arc<StubTextEngine>) -> PdfPipelineBuilder {
    PdfPipeline::builder()
        .with_text_engine(text)
        .with_rasterizer(Arc::new(StubRasterizer::new()))
        .with_ocr_backend(Arc::new(StubOcrBackend::new(Vec::<String>::new())))
        .with_table_detector(Arc::new(StubTableDetector::new(RawTableResult::default())))
}

/// Placeholder input for pipelines whose text engine is stubbed.
pub fn any_pdf() -> Vec<u8> {
    build_pdf(&[&["placeholder"]])
}
