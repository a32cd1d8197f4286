//! Page-by-page OCR over a rendered PDF.
//!
//! Each page goes through the same steps: choose the language set (fixed,
//! multi-language with English fallback, or auto-detected from the text
//! recognized so far), optionally enhance the rendered image, recognize,
//! optionally post-correct, and append the text behind a page marker.
//!
//! Pages run sequentially by default. In parallel mode they are rendered and
//! recognized in batches of `max_workers`; a batch is awaited as a whole and
//! its pages are reassembled by position, so the output order never depends on
//! task completion order.

use super::cache::OcrCache;
use super::utils::{REDETECT_TEXT_THRESHOLD, SAMPLE_SCALE, join_languages, page_marker};
use crate::core::config::{LanguageHandling, OcrOptions};
use crate::language_detection::{DEFAULT_LANGUAGE, detect_language, iso639_1, language_stats, map_to_engine_code};
use crate::plugins::{EnhancementOptions, ImageEnhancer, OcrBackend, PageRasterizer};
use crate::text::OcrPostProcessor;
use crate::types::ExtractionResult;
use crate::{HarvestError, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Text and diagnostics of one OCR run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutcome {
    /// Page-marked text, post-corrected when correction is enabled.
    pub text: String,
    /// Page-marked text before correction; only set when correction ran.
    pub original_text: Option<String>,
    pub mode: LanguageHandling,
    /// Configured languages, primary first.
    pub languages: Vec<String>,
    /// Engine codes chosen by auto-detection, in order of first use.
    pub detected_languages: Vec<String>,
    pub language_stats: BTreeMap<String, u32>,
    pub pages_processed: usize,
}

impl OcrOutcome {
    /// Copy the language diagnostics onto `result`.
    pub fn apply_diagnostics(&self, result: &mut ExtractionResult) {
        match self.mode {
            LanguageHandling::Single => {
                result.ocr_language = self.languages.first().cloned();
            }
            LanguageHandling::Multiple => {
                result.ocr_languages = Some(self.languages.clone());
            }
            LanguageHandling::Auto => {
                result.ocr_language_detection = Some(true);
                result.ocr_detected_languages = Some(self.detected_languages.clone());
            }
        }
        result.ocr_language_stats = Some(self.language_stats.clone());
    }
}

/// Languages handed to the backend for one page.
#[derive(Debug, Clone, PartialEq)]
struct LanguagePlan {
    languages: Vec<String>,
    /// Retry with English alone when the combined set fails.
    fallback_to_english: bool,
}

impl LanguagePlan {
    fn single(language: &str) -> Self {
        Self {
            languages: vec![language.to_string()],
            fallback_to_english: false,
        }
    }

    /// English first, then the configured languages, without duplicates.
    fn multiple(options: &OcrOptions) -> Self {
        let mut languages = vec![DEFAULT_LANGUAGE.to_string()];
        for lang in std::iter::once(&options.language).chain(options.additional_languages.iter()) {
            let lang = lang.trim();
            if !lang.is_empty() && !languages.iter().any(|l| l == lang) {
                languages.push(lang.to_string());
            }
        }
        let fallback_to_english = languages.len() > 1;
        Self {
            languages,
            fallback_to_english,
        }
    }

    fn primary(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Settings shared by every page of one run.
#[derive(Debug, Clone)]
struct PageSettings {
    enhance_image: bool,
    enhancement: EnhancementOptions,
    correct: bool,
    correction_level: crate::core::config::CorrectionLevel,
    spell_check_language: Option<String>,
    use_cache: bool,
}

#[derive(Debug)]
struct PageText {
    raw: String,
    corrected: Option<String>,
}

/// The OCR stage: rasterizer, optional enhancer, backend, post-processor and cache.
#[derive(Clone)]
pub struct OcrEngine {
    rasterizer: Arc<dyn PageRasterizer>,
    backend: Arc<dyn OcrBackend>,
    enhancer: Arc<dyn ImageEnhancer>,
    post_processor: Arc<OcrPostProcessor>,
    cache: Arc<OcrCache>,
}

impl OcrEngine {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        backend: Arc<dyn OcrBackend>,
        enhancer: Arc<dyn ImageEnhancer>,
        post_processor: Arc<OcrPostProcessor>,
        cache: Arc<OcrCache>,
    ) -> Self {
        Self {
            rasterizer,
            backend,
            enhancer,
            post_processor,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<OcrCache> {
        &self.cache
    }

    /// OCR `pages` (1-based) of the PDF at `pdf_path`.
    ///
    /// # Errors
    ///
    /// `OcrFailed` with the engine message when a page cannot be recognized.
    /// Rasterizer errors are returned as raised; the pipeline reports them
    /// under the OCR stage. Enhancement and post-correction failures never
    /// surface: the page falls back to the unenhanced image or uncorrected text.
    pub async fn run(
        &self,
        pdf_path: &Path,
        pages: &[u32],
        options: &OcrOptions,
        show_progress: bool,
    ) -> Result<OcrOutcome> {
        let settings = PageSettings {
            enhance_image: options.enhance_image,
            enhancement: EnhancementOptions::default(),
            correct: options.enhance_results,
            correction_level: options.correction_level,
            spell_check_language: options.spell_check_language.clone(),
            use_cache: options.use_cache,
        };

        let mut plan = match options.language_handling {
            LanguageHandling::Single | LanguageHandling::Auto => LanguagePlan::single(&options.language),
            LanguageHandling::Multiple => LanguagePlan::multiple(options),
        };
        let configured: Vec<String> = match options.language_handling {
            LanguageHandling::Multiple => {
                let mut languages = vec![options.language.clone()];
                for lang in &options.additional_languages {
                    if !languages.contains(lang) {
                        languages.push(lang.clone());
                    }
                }
                languages
            }
            _ => vec![options.language.clone()],
        };

        tracing::info!(
            pages = pages.len(),
            mode = ?options.language_handling,
            languages = %join_languages(&plan.languages),
            "Starting OCR"
        );

        let scale = options.render_scale();
        let batch_size = if options.parallel {
            options.effective_max_workers()
        } else {
            1
        };

        let mut text = String::new();
        let mut original = String::new();
        let mut detected: Vec<String> = Vec::new();
        let mut done = 0usize;

        for batch in pages.chunks(batch_size.max(1)) {
            if options.language_handling == LanguageHandling::Auto && (done == 0 || text.len() > REDETECT_TEXT_THRESHOLD)
            {
                let lang = self.detect_page_language(pdf_path, pages, &text).await;
                if !detected.contains(&lang) {
                    detected.push(lang.clone());
                }
                tracing::debug!(language = %lang, "Auto-detected OCR language");
                plan = LanguagePlan::single(&lang);
            }

            let indices: Vec<u32> = batch.iter().map(|p| p.saturating_sub(1)).collect();
            let images = self.rasterizer.rasterize(pdf_path, &indices, scale).await?;
            if images.len() != batch.len() {
                return Err(HarvestError::image_extraction_failed(format!(
                    "Rasterizer returned {} images for {} pages",
                    images.len(),
                    batch.len()
                )));
            }

            let results = if batch.len() == 1 {
                let (page, image) = (batch[0], images.into_iter().next().unwrap_or_default());
                vec![self.process_page(page, image, &plan, &settings).await?]
            } else {
                self.process_batch(batch, images, &plan, &settings).await?
            };

            for (page, page_text) in batch.iter().zip(results) {
                done += 1;
                match page_text.corrected {
                    Some(corrected) => {
                        text.push_str(&page_marker(*page, &corrected));
                        original.push_str(&page_marker(*page, &page_text.raw));
                    }
                    None => text.push_str(&page_marker(*page, &page_text.raw)),
                }

                let pct = ((done as f64 / pages.len() as f64) * 100.0).round() as u32;
                if show_progress {
                    tracing::info!("OCR progress: {}% (page {})", pct, page);
                } else {
                    tracing::debug!("OCR progress: {}% (page {})", pct, page);
                }
            }
        }

        if !detected.is_empty() {
            tracing::info!(languages = %detected.join(", "), "Languages detected in document");
        }

        let language_stats = language_stats(&text);
        Ok(OcrOutcome {
            text,
            original_text: settings.correct.then_some(original),
            mode: options.language_handling,
            languages: configured,
            detected_languages: detected,
            language_stats,
            pages_processed: done,
        })
    }

    /// Engine language code for the next pages in auto mode.
    ///
    /// Uses the accumulated text when there is any, otherwise a low-resolution
    /// English pass over the first selected page. Any failure yields `eng`.
    async fn detect_page_language(&self, pdf_path: &Path, pages: &[u32], accumulated: &str) -> String {
        let sample = if accumulated.trim().is_empty() {
            match self.sample_text(pdf_path, pages).await {
                Ok(sample) => sample,
                Err(e) => {
                    tracing::warn!(error = %e, "Language detection sample failed, using default language");
                    return DEFAULT_LANGUAGE.to_string();
                }
            }
        } else {
            accumulated.to_string()
        };

        map_to_engine_code(detect_language(&sample)).to_string()
    }

    async fn sample_text(&self, pdf_path: &Path, pages: &[u32]) -> Result<String> {
        let Some(first) = pages.first() else {
            return Ok(String::new());
        };
        let images = self
            .rasterizer
            .rasterize(pdf_path, &[first.saturating_sub(1)], SAMPLE_SCALE)
            .await?;
        let Some(image) = images.first() else {
            return Ok(String::new());
        };
        self.backend.recognize(image, &[DEFAULT_LANGUAGE.to_string()]).await
    }

    async fn process_batch(
        &self,
        batch: &[u32],
        images: Vec<Vec<u8>>,
        plan: &LanguagePlan,
        settings: &PageSettings,
    ) -> Result<Vec<PageText>> {
        let mut tasks = JoinSet::new();
        for (position, (page, image)) in batch.iter().copied().zip(images).enumerate() {
            let engine = self.clone();
            let plan = plan.clone();
            let settings = settings.clone();
            tasks.spawn(async move { (position, engine.process_page(page, image, &plan, &settings).await) });
        }

        let mut slots: Vec<Option<PageText>> = std::iter::repeat_with(|| None).take(batch.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            let (position, result) =
                joined.map_err(|e| HarvestError::ocr_failed(format!("OCR worker task failed: {}", e)))?;
            slots[position] = Some(result?);
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| HarvestError::ocr_failed("OCR worker produced no result")))
            .collect()
    }

    async fn process_page(
        &self,
        page: u32,
        image: Vec<u8>,
        plan: &LanguagePlan,
        settings: &PageSettings,
    ) -> Result<PageText> {
        let cache_key = OcrCache::cache_key(
            &image,
            self.backend.name(),
            &format!(
                "languages={}&fallback={}&enhance={}",
                join_languages(&plan.languages),
                plan.fallback_to_english,
                settings.enhance_image
            ),
        );

        let cached = if settings.use_cache {
            self.cache.get(&cache_key)
        } else {
            None
        };

        let raw = match cached {
            Some(text) => {
                tracing::debug!(page, "OCR cache hit");
                text
            }
            None => {
                let text = self.recognize_page(page, image, plan, settings).await?;
                if settings.use_cache {
                    self.cache.insert(cache_key, text.clone());
                }
                text
            }
        };

        let corrected = settings.correct.then(|| {
            let language = settings
                .spell_check_language
                .clone()
                .unwrap_or_else(|| iso639_1(plan.primary()).to_string());
            self.post_processor.correct(&raw, &language, settings.correction_level)
        });

        Ok(PageText { raw, corrected })
    }

    async fn recognize_page(
        &self,
        page: u32,
        image: Vec<u8>,
        plan: &LanguagePlan,
        settings: &PageSettings,
    ) -> Result<String> {
        let image = if settings.enhance_image {
            self.enhance_page(page, image, settings).await
        } else {
            image
        };

        match self.backend.recognize(&image, &plan.languages).await {
            Ok(text) => Ok(text),
            Err(e) if plan.fallback_to_english => {
                tracing::warn!(
                    page,
                    languages = %join_languages(&plan.languages),
                    error = %e,
                    "Multi-language OCR failed, retrying with English only"
                );
                self.backend.recognize(&image, &[DEFAULT_LANGUAGE.to_string()]).await
            }
            Err(e) => Err(e),
        }
    }

    /// Enhanced copy of `image`, or `image` itself when any step fails.
    async fn enhance_page(&self, page: u32, image: Vec<u8>, settings: &PageSettings) -> Vec<u8> {
        // Enhanced copies live next to the page image and go away with the directory.
        let dir = match tempfile::Builder::new()
            .prefix(crate::core::io::TEMP_FILE_PREFIX)
            .tempdir()
        {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(page, error = %e, "Could not create enhancement directory, using original");
                return image;
            }
        };

        let source = dir.path().join(format!("ocr_page_{}.png", page));
        if let Err(e) = tokio::fs::write(&source, &image).await {
            tracing::warn!(page, error = %e, "Could not write page image for enhancement");
            return image;
        }

        let enhanced = self.enhancer.enhance(&source, &settings.enhancement).await;
        if enhanced == source {
            return image;
        }

        match tokio::fs::read(&enhanced).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(page, error = %e, "Could not read enhanced image, using original");
                image
            }
        }
    }
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine")
            .field("rasterizer", &self.rasterizer.name())
            .field("backend", &self.backend.name())
            .field("enhancer", &self.enhancer.name())
            .finish()
    }
}
