//! Extraction pipeline.
//!
//! [`PdfPipeline`] runs one PDF through every requested stage and merges the
//! outcome into a single [`ExtractionResult`]:
//!
//! 1. Load and validate the input (size limit, encryption marker).
//! 2. Probe the first page for the page count and metadata.
//! 3. Resolve the page selection.
//! 4. Extract text, whole or in chunks.
//! 5. Optionally rasterize pages, detect tables and run OCR (OCR only when no
//!    text was found).
//! 6. Optionally classify the document and extract its fields.
//!
//! Optional stages fail independently. With `continueOnError` their errors
//! are logged and recorded in the result's `*Error` fields; otherwise the
//! first failure aborts the run. Structural errors always abort.

use crate::classification::{classify, extract_document_fields};
use crate::core::config::ProcessingOptions;
use crate::core::io::{InputSource, PdfInput};
use crate::imaging::PixelEnhancer;
use crate::ocr::{OcrCache, OcrEngine, TesseractCliBackend};
use crate::pages::{chunk, resolve_pages};
use crate::pdf::text::PAGE_SEPARATOR;
use crate::pdf::{LayoutTableDetector, LopdfTextEngine, PdftoppmRasterizer};
use crate::plugins::{ImageEnhancer, OcrBackend, PageRasterizer, SpellChecker, TableDetector, TextExtractionEngine};
use crate::tables::format_tables;
use crate::text::{DictionarySpellChecker, OcrPostProcessor};
use crate::types::{ExtractionResult, PageImage, PerformanceMetrics};
use crate::{HarvestError, Result, Stage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Warning attached when a run produced no text.
pub const NO_TEXT_WARNING: &str = "No text was extracted. This might be a scanned PDF or an image-based PDF without text layer. Try enabling the OCR option.";

/// Rasterization scale of page images returned to the caller.
pub const PAGE_IMAGE_SCALE: f32 = 1.0;

/// Extraction pipeline with its engine adapters.
///
/// Cheap to clone; adapters and the OCR cache are shared.
///
/// # Example
///
/// ```rust,no_run
/// use pdf_harvest::core::config::ProcessingOptions;
/// use pdf_harvest::core::pipeline::PdfPipeline;
/// use std::path::PathBuf;
///
/// # async fn example() -> pdf_harvest::Result<()> {
/// let pipeline = PdfPipeline::builder().build()?;
/// let mut options = ProcessingOptions::default();
/// options.features.extract_tables = true;
///
/// let result = pipeline.extract(PathBuf::from("invoice.pdf"), &options).await?;
/// println!("{} tables", result.tables.map(|t| t.len()).unwrap_or(0));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PdfPipeline {
    text_engine: Arc<dyn TextExtractionEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
    table_detector: Arc<dyn TableDetector>,
    ocr: OcrEngine,
}

impl PdfPipeline {
    pub fn builder() -> PdfPipelineBuilder {
        PdfPipelineBuilder::default()
    }

    pub fn ocr_cache(&self) -> &Arc<OcrCache> {
        self.ocr.cache()
    }

    /// Run every stage `options` asks for on `source`.
    ///
    /// # Errors
    ///
    /// - `Validation` for inconsistent options
    /// - `FileNotFound`, `FileTooLarge`, `EncryptedDocument` while loading
    /// - `CorruptDocument` when the document cannot be parsed
    /// - `InvalidRangeFormat` / `PageOutOfRange` for a bad page selection
    /// - the failing stage's error (`OcrFailed`, `ImageExtractionFailed`,
///   `TableExtractionFailed`, `ClassificationFailed`) when `continueOnError`
///   is off, wrapping whatever the stage's adapters raised
    pub async fn extract(&self, source: impl Into<InputSource>, options: &ProcessingOptions) -> Result<ExtractionResult> {
        options.validate()?;
        let started = Instant::now();
        let continue_on_error = options.performance.continue_on_error;

        let mut input = PdfInput::load(source.into(), options.performance.max_file_size_mb).await?;
        tracing::debug!(size_mb = format!("{:.2}", input.size_mb()), "Loaded PDF");

        let probe = self.text_engine.probe(input.bytes()).await?;
        let total_pages = probe.page_count();
        let pages = resolve_pages(
            options.pages.page_range.as_deref(),
            options.pages.first_page_only,
            total_pages,
        )?;
        tracing::info!(total_pages, selected = pages.len(), "Processing PDF");

        let mut result = ExtractionResult::default();

        if options.features.extract_text {
            result.text = self.extract_text(input.bytes(), &pages, options).await?;
        }

        if options.features.include_metadata {
            result.metadata = Some(probe.metadata);
        }

        if options.features.extract_images {
            let images = match input.ensure_path().map(Path::to_path_buf) {
                Ok(path) => self.extract_images(&path, &pages).await,
                Err(e) => Err(e),
            };
            match images {
                Ok(images) => result.images = Some(images),
                Err(e) => {
                    result.image_extraction_error = Some(downgrade(Stage::ImageExtraction, e, continue_on_error)?)
                }
            }
        }

        if options.features.extract_tables {
            let tables = match input.ensure_path().map(Path::to_path_buf) {
                Ok(path) => self.extract_tables(&path, &pages, options).await,
                Err(e) => Err(e),
            };
            match tables {
                Ok(tables) => result.tables = Some(tables),
                Err(e) => {
                    result.table_extraction_error = Some(downgrade(Stage::TableExtraction, e, continue_on_error)?)
                }
            }
        }

        if options.features.perform_ocr && result.text.trim().is_empty() {
            tracing::info!("No text found in PDF, attempting OCR");
            let outcome = match input.ensure_path().map(Path::to_path_buf) {
                Ok(path) => {
                    self.ocr
                        .run(&path, &pages, &options.ocr, options.performance.show_progress)
                        .await
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(outcome) => {
                    outcome.apply_diagnostics(&mut result);
                    result.text = outcome.text;
                    result.original_ocr_text = outcome.original_text;
                    tracing::info!(pages = outcome.pages_processed, "OCR completed");
                }
                Err(e) => result.ocr_error = Some(downgrade(Stage::Ocr, e, continue_on_error)?),
            }
        }

        if result.text.trim().is_empty() {
            result.warning = Some(NO_TEXT_WARNING.to_string());
        }

        if options.recognition.detect_document_type && !result.text.trim().is_empty() {
            if let Err(e) = self.recognize(&mut result, options) {
                result.document_classification_error = Some(downgrade(Stage::Classification, e, continue_on_error)?);
            }
        }

        drop(input);

        result.performance = PerformanceMetrics::from_elapsed(started.elapsed(), pages.len());
        tracing::info!(
            processing_time = %result.performance.processing_time,
            pages = pages.len(),
            "PDF processing finished"
        );

        Ok(result)
    }

    /// Text of `pages`, chunked when the selection exceeds the chunk size.
    async fn extract_text(&self, bytes: &[u8], pages: &[u32], options: &ProcessingOptions) -> Result<String> {
        let perf = &options.performance;

        if !(perf.process_in_chunks && pages.len() > perf.chunk_size) {
            return match self.text_engine.extract(bytes, Some(pages)).await {
                Ok(extraction) => Ok(extraction.text),
                Err(e) if perf.continue_on_error && !e.is_structural() => {
                    tracing::warn!(error = %e, "Text extraction failed, continuing without text");
                    Ok(String::new())
                }
                Err(e) => Err(e),
            };
        }

        let chunks = chunk(pages, perf.chunk_size)?;
        let mut text = String::new();
        let mut done = 0usize;

        for (i, chunk_pages) in chunks.iter().enumerate() {
            match self.text_engine.extract(bytes, Some(chunk_pages)).await {
                Ok(extraction) => {
                    if !text.is_empty() && !extraction.text.is_empty() {
                        text.push_str(PAGE_SEPARATOR);
                    }
                    text.push_str(&extraction.text);
                }
                Err(e) if perf.continue_on_error => {
                    tracing::warn!(
                        chunk = i + 1,
                        pages = ?chunk_pages,
                        error = %e,
                        "Skipping chunk that failed to extract"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }

            done += chunk_pages.len();
            let pct = done as f64 / pages.len() as f64 * 100.0;
            if perf.show_progress {
                tracing::info!("Processing PDF: {:.1}% complete ({}/{} pages)", pct, done, pages.len());
            } else {
                tracing::debug!("Processing PDF: {:.1}% complete ({}/{} pages)", pct, done, pages.len());
            }
        }

        Ok(text)
    }

    /// Rasterize `pages` into PNG data URIs, in selection order.
    async fn extract_images(&self, path: &Path, pages: &[u32]) -> Result<Vec<PageImage>> {
        let indices: Vec<u32> = pages.iter().map(|p| p.saturating_sub(1)).collect();
        let images = self.rasterizer.rasterize(path, &indices, PAGE_IMAGE_SCALE).await?;

        if images.len() != pages.len() {
            return Err(HarvestError::image_extraction_failed(format!(
                "Failed to extract images from PDF: expected {} images, got {}",
                pages.len(),
                images.len()
            )));
        }

        Ok(pages
            .iter()
            .zip(images)
            .map(|(page, png)| PageImage {
                page: *page,
                image_data: format!("data:image/png;base64,{}", STANDARD.encode(png)),
            })
            .collect())
    }

    async fn extract_tables(
        &self,
        path: &Path,
        pages: &[u32],
        options: &ProcessingOptions,
    ) -> Result<Vec<crate::types::FormattedTable>> {
        let raw = self.table_detector.detect_tables(path, Some(pages)).await?;
        let tables = format_tables(&raw, &options.tables);
        tracing::debug!(tables = tables.len(), "Tables extracted");
        Ok(tables)
    }

    /// Classification and, when requested, field extraction.
    fn recognize(&self, result: &mut ExtractionResult, options: &ProcessingOptions) -> Result<()> {
        let recognition = &options.recognition;
        let custom_dir = recognition.custom_templates_path.as_deref();

        let classification = classify(&result.text, &recognition.categories, custom_dir)?;
        tracing::info!(
            document_type = %classification.document_type,
            confidence = classification.confidence,
            "Document type detected"
        );

        if recognition.extract_form_fields && !classification.document_type.is_empty() {
            let tables = result.tables.as_deref().unwrap_or_default();
            let fields = extract_document_fields(&result.text, tables, &classification.document_type, custom_dir)?;
            result.extracted_fields = Some(fields);
        }

        result.document_classification = Some(classification);
        Ok(())
    }

    /// Shut every adapter down.
    pub fn shutdown(&self) -> Result<()> {
        self.text_engine.shutdown()?;
        self.rasterizer.shutdown()?;
        self.table_detector.shutdown()?;
        Ok(())
    }
}

impl std::fmt::Debug for PdfPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfPipeline")
            .field("text_engine", &self.text_engine.name())
            .field("rasterizer", &self.rasterizer.name())
            .field("table_detector", &self.table_detector.name())
            .field("ocr", &self.ocr)
            .finish()
    }
}

/// Report a stage failure under the stage's own kind, then either record it
/// (continue-on-error) or abort with it.
fn downgrade(stage: Stage, error: HarvestError, continue_on_error: bool) -> Result<String> {
    let error = error.in_stage(stage);
    if continue_on_error && !error.is_structural() {
        tracing::warn!(stage = stage.label(), error = %error, "Stage failed, continuing");
        Ok(error.detail())
    } else {
        Err(error)
    }
}

/// Builder for [`PdfPipeline`]. Unset adapters use the production defaults.
#[derive(Default)]
pub struct PdfPipelineBuilder {
    text_engine: Option<Arc<dyn TextExtractionEngine>>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    enhancer: Option<Arc<dyn ImageEnhancer>>,
    ocr_backend: Option<Arc<dyn OcrBackend>>,
    table_detector: Option<Arc<dyn TableDetector>>,
    spellchecker: Option<Arc<dyn SpellChecker>>,
    ocr_cache: Option<Arc<OcrCache>>,
    cache_ttl: Option<Duration>,
}

impl PdfPipelineBuilder {
    pub fn with_text_engine(mut self, engine: Arc<dyn TextExtractionEngine>) -> Self {
        self.text_engine = Some(engine);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn ImageEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_ocr_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.ocr_backend = Some(backend);
        self
    }

    pub fn with_table_detector(mut self, detector: Arc<dyn TableDetector>) -> Self {
        self.table_detector = Some(detector);
        self
    }

    pub fn with_spellchecker(mut self, spellchecker: Arc<dyn SpellChecker>) -> Self {
        self.spellchecker = Some(spellchecker);
        self
    }

    /// Share an existing OCR cache. Takes precedence over [`cache_ttl`](Self::cache_ttl).
    pub fn with_ocr_cache(mut self, cache: Arc<OcrCache>) -> Self {
        self.ocr_cache = Some(cache);
        self
    }

    /// Entry lifetime of the OCR cache the builder creates.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Initialize every adapter and assemble the pipeline.
    ///
    /// # Errors
    ///
    /// The first adapter `initialize` failure, typically `MissingDependency`.
    pub fn build(self) -> Result<PdfPipeline> {
        let text_engine = self
            .text_engine
            .unwrap_or_else(|| Arc::new(LopdfTextEngine::new()));
        let rasterizer = self
            .rasterizer
            .unwrap_or_else(|| Arc::new(PdftoppmRasterizer::new()));
        let enhancer = self.enhancer.unwrap_or_else(|| Arc::new(PixelEnhancer::new()));
        let ocr_backend = self
            .ocr_backend
            .unwrap_or_else(|| Arc::new(TesseractCliBackend::new()));
        let table_detector = self
            .table_detector
            .unwrap_or_else(|| Arc::new(LayoutTableDetector::new()));
        let spellchecker = self
            .spellchecker
            .unwrap_or_else(|| Arc::new(DictionarySpellChecker::new()));
        let cache = match (self.ocr_cache, self.cache_ttl) {
            (Some(cache), _) => cache,
            (None, Some(ttl)) => Arc::new(OcrCache::new(ttl)),
            (None, None) => Arc::new(OcrCache::default()),
        };

        text_engine.initialize()?;
        rasterizer.initialize()?;
        enhancer.initialize()?;
        ocr_backend.initialize()?;
        table_detector.initialize()?;
        spellchecker.initialize()?;

        tracing::debug!(
            text_engine = text_engine.name(),
            rasterizer = rasterizer.name(),
            ocr_backend = ocr_backend.name(),
            table_detector = table_detector.name(),
            "Pipeline assembled"
        );

        let ocr = OcrEngine::new(
            Arc::clone(&rasterizer),
            ocr_backend,
            enhancer,
            Arc::new(OcrPostProcessor::new(spellchecker)),
            cache,
        );

        Ok(PdfPipeline {
            text_engine,
            rasterizer,
            table_detector,
            ocr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_pdf::build_pdf;

    fn text_only_pipeline() -> PdfPipeline {
        PdfPipeline::builder().build().unwrap()
    }

    fn sample_pdf() -> Vec<u8> {
        build_pdf(&[
            &[("Invoice #: INV-42", 72, 720)],
            &[("Total: $10.00", 72, 720)],
            &[("Thank you", 72, 720)],
        ])
    }

    #[tokio::test]
    async fn test_extract_text_and_metadata() {
        let mut options = ProcessingOptions::default();
        options.features.include_metadata = true;

        let result = text_only_pipeline().extract(sample_pdf(), &options).await.unwrap();
        assert!(result.text.contains("INV-42"));
        assert!(result.text.contains("Thank you"));
        assert!(result.warning.is_none());
        assert_eq!(result.metadata.unwrap().number_of_pages, 3);
        assert_eq!(result.performance.pages_processed, 3);
    }

    #[tokio::test]
    async fn test_page_range_limits_text() {
        let mut options = ProcessingOptions::default();
        options.pages.page_range = Some("2".to_string());

        let result = text_only_pipeline().extract(sample_pdf(), &options).await.unwrap();
        assert!(result.text.contains("$10.00"));
        assert!(!result.text.contains("INV-42"));
        assert_eq!(result.performance.pages_processed, 1);
    }

    #[tokio::test]
    async fn test_chunked_text_matches_whole_text() {
        let pipeline = text_only_pipeline();
        let whole = pipeline
            .extract(sample_pdf(), &ProcessingOptions::default())
            .await
            .unwrap();

        let mut options = ProcessingOptions::default();
        options.performance.process_in_chunks = true;
        options.performance.chunk_size = 1;
        options.performance.show_progress = true;
        let chunked = pipeline.extract(sample_pdf(), &options).await.unwrap();

        assert_eq!(whole.text, chunked.text);
    }

    #[tokio::test]
    async fn test_page_out_of_range_is_fatal() {
        let mut options = ProcessingOptions::default();
        options.pages.page_range = Some("1-9".to_string());
        options.performance.continue_on_error = true;

        let err = text_only_pipeline().extract(sample_pdf(), &options).await.unwrap_err();
        assert!(matches!(err, HarvestError::PageOutOfRange { page: 9, total: 3 }));
    }

    #[tokio::test]
    async fn test_empty_text_sets_warning() {
        let mut options = ProcessingOptions::default();
        options.features.extract_text = false;

        let result = text_only_pipeline().extract(sample_pdf(), &options).await.unwrap();
        assert_eq!(result.warning.as_deref(), Some(NO_TEXT_WARNING));
    }

    #[tokio::test]
    async fn test_classification_and_fields() {
        let mut options = ProcessingOptions::default();
        options.recognition.detect_document_type = true;
        options.recognition.extract_form_fields = true;
        options.recognition.categories = vec!["invoice".into(), "receipt".into()];

        let pdf = build_pdf(&[&[
            ("INVOICE", 72, 740),
            ("Invoice #: INV-7", 72, 720),
            ("Due Date: 01/02/2025", 72, 700),
        ]]);
        let result = text_only_pipeline().extract(pdf, &options).await.unwrap();

        let classification = result.document_classification.unwrap();
        assert_eq!(classification.document_type, "invoice");
        let fields = result.extracted_fields.unwrap();
        assert_eq!(fields["invoiceNumber"].as_text(), Some("INV-7"));
        assert_eq!(fields["dueDate"].as_text(), Some("01/02/2025"));
    }

    #[test]
    fn test_downgrade() {
        assert_eq!(
            downgrade(Stage::Ocr, HarvestError::ocr_failed("boom"), true).unwrap(),
            "boom"
        );
        assert!(downgrade(Stage::Ocr, HarvestError::ocr_failed("boom"), false).is_err());
        assert!(downgrade(Stage::Ocr, HarvestError::EncryptedDocument, true).is_err());
    }

    #[test]
    fn test_downgrade_reports_under_stage_kind() {
        let io = HarvestError::from(std::io::Error::other("scratch dir missing"));
        assert_eq!(
            downgrade(Stage::TableExtraction, io, true).unwrap(),
            "IO error: scratch dir missing"
        );

        let err = downgrade(
            Stage::Ocr,
            HarvestError::image_extraction_failed("renderer exited with status 1"),
            false,
        )
        .unwrap_err();
        assert_eq!(err.code(), "ERR_OCR_FAILED");
    }

}
