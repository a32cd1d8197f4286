//! pdf-harvest command-line host.
//!
//! ```bash
//! pdf-harvest extract invoice.pdf --tables --classify --fields
//! pdf-harvest extract scan.pdf --ocr --language-handling auto --continue-on-error
//! pdf-harvest extract report.pdf --config pdf-harvest.toml --pages 1-3,5
//! pdf-harvest config
//! ```
//!
//! Results are printed to stdout as JSON. Logs go to stderr and are filtered
//! with `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_harvest::core::config::{CorrectionLevel, LanguageHandling, OcrQuality};
use pdf_harvest::{ExtractionResult, HarvestError, PdfPipeline, ProcessingOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdf-harvest", version, about = "Extract text, tables and fields from PDF documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract content from one or more PDF files
    Extract(ExtractArgs),

    /// Print the effective options as JSON
    Config {
        /// Options file (TOML, YAML or JSON); `pdf-harvest.toml` is discovered when omitted
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// PDF files to process, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Options file (TOML, YAML or JSON); `pdf-harvest.toml` is discovered when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Page selection such as `1-3,5`
    #[arg(long)]
    pages: Option<String>,

    #[arg(long)]
    first_page_only: bool,

    /// Skip the text layer
    #[arg(long)]
    no_text: bool,

    #[arg(long)]
    metadata: bool,

    /// Rasterize selected pages into base64 PNG data URIs
    #[arg(long)]
    images: bool,

    #[arg(long)]
    tables: bool,

    /// Run OCR when the text layer is empty
    #[arg(long)]
    ocr: bool,

    #[arg(long, value_enum)]
    language_handling: Option<LanguageHandlingArg>,

    /// Primary OCR language (Tesseract code, e.g. `eng`)
    #[arg(long)]
    language: Option<String>,

    /// Extra OCR languages for `multiple` mode
    #[arg(long, value_delimiter = ',')]
    additional_languages: Vec<String>,

    #[arg(long, value_enum)]
    quality: Option<QualityArg>,

    /// Preprocess page images before OCR
    #[arg(long)]
    enhance_image: bool,

    /// Post-correct OCR text at the given level
    #[arg(long, value_enum)]
    correct: Option<CorrectionArg>,

    /// OCR pages in parallel batches
    #[arg(long)]
    parallel: bool,

    /// Classify the document type
    #[arg(long)]
    classify: bool,

    /// Extract fields for the detected document type (implies --classify)
    #[arg(long)]
    fields: bool,

    /// Candidate categories, comma-separated, in tie-break order
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Directory of custom `*.json` document templates
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Extract text in chunks of this many pages
    #[arg(long)]
    chunk_size: Option<usize>,

    #[arg(long)]
    max_file_size_mb: Option<f64>,

    /// Record optional stage failures in the result instead of aborting
    #[arg(long)]
    continue_on_error: bool,

    /// Log progress at info level
    #[arg(long)]
    progress: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageHandlingArg {
    Single,
    Multiple,
    Auto,
}

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    Fast,
    Balanced,
    Accurate,
}

#[derive(Clone, Copy, ValueEnum)]
enum CorrectionArg {
    Light,
    Medium,
    Aggressive,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(config: Option<&PathBuf>) -> Result<ProcessingOptions> {
    match config {
        Some(path) => ProcessingOptions::from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display())),
        None => Ok(ProcessingOptions::discover()
            .context("Failed to discover options file")?
            .unwrap_or_default()),
    }
}

impl ExtractArgs {
    /// Command-line flags layered over the loaded options.
    fn apply(&self, options: &mut ProcessingOptions) {
        if let Some(pages) = &self.pages {
            options.pages.page_range = Some(pages.clone());
        }
        options.pages.first_page_only |= self.first_page_only;

        if self.no_text {
            options.features.extract_text = false;
        }
        options.features.include_metadata |= self.metadata;
        options.features.extract_images |= self.images;
        options.features.extract_tables |= self.tables;
        options.features.perform_ocr |= self.ocr;

        if let Some(mode) = self.language_handling {
            options.ocr.language_handling = match mode {
                LanguageHandlingArg::Single => LanguageHandling::Single,
                LanguageHandlingArg::Multiple => LanguageHandling::Multiple,
                LanguageHandlingArg::Auto => LanguageHandling::Auto,
            };
        }
        if let Some(language) = &self.language {
            options.ocr.language = language.clone();
        }
        if !self.additional_languages.is_empty() {
            options.ocr.additional_languages = self.additional_languages.clone();
        }
        if let Some(quality) = self.quality {
            options.ocr.quality = Some(match quality {
                QualityArg::Fast => OcrQuality::Fast,
                QualityArg::Balanced => OcrQuality::Balanced,
                QualityArg::Accurate => OcrQuality::Accurate,
            });
        }
        options.ocr.enhance_image |= self.enhance_image;
        if let Some(level) = self.correct {
            options.ocr.enhance_results = true;
            options.ocr.correction_level = match level {
                CorrectionArg::Light => CorrectionLevel::Light,
                CorrectionArg::Medium => CorrectionLevel::Medium,
                CorrectionArg::Aggressive => CorrectionLevel::Aggressive,
            };
        }
        options.ocr.parallel |= self.parallel;

        options.recognition.detect_document_type |= self.classify || self.fields;
        options.recognition.extract_form_fields |= self.fields;
        if !self.categories.is_empty() {
            options.recognition.categories = self
                .categories
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(templates) = &self.templates {
            options.recognition.custom_templates_path = Some(templates.clone());
        }

        if let Some(chunk_size) = self.chunk_size {
            options.performance.process_in_chunks = true;
            options.performance.chunk_size = chunk_size;
        }
        if let Some(max) = self.max_file_size_mb {
            options.performance.max_file_size_mb = max;
        }
        options.performance.continue_on_error |= self.continue_on_error;
        options.performance.show_progress |= self.progress;
    }
}

fn build_pipeline(options: &ProcessingOptions) -> pdf_harvest::Result<PdfPipeline> {
    let builder = PdfPipeline::builder().cache_ttl(Duration::from_secs(options.ocr.cache_ttl_secs));

    #[cfg(feature = "pdfium")]
    let builder = builder.with_rasterizer(std::sync::Arc::new(pdf_harvest::pdf::PdfiumRasterizer::new()));

    builder.build()
}

fn to_json(value: &serde_json::Value, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize output")
}

/// JSON object for one file: the result, or `{error, code}` when it failed.
fn file_output(result: &pdf_harvest::Result<ExtractionResult>) -> Result<serde_json::Value> {
    Ok(match result {
        Ok(result) => serde_json::to_value(result).context("Failed to serialize result")?,
        Err(e) => error_json(e),
    })
}

fn error_json(error: &HarvestError) -> serde_json::Value {
    serde_json::json!({
        "error": error.to_string(),
        "code": error.code(),
    })
}

async fn run_extract(args: ExtractArgs) -> Result<bool> {
    let mut options = load_options(args.config.as_ref())?;
    args.apply(&mut options);
    options.validate().context("Invalid options")?;

    let pipeline = build_pipeline(&options).context("Failed to initialize extraction engines")?;

    let mut outputs = Vec::with_capacity(args.files.len());
    let mut all_ok = true;
    for file in &args.files {
        tracing::info!(file = %file.display(), "Extracting");
        let result = pipeline.extract(file.clone(), &options).await;
        if let Err(e) = &result {
            tracing::error!(file = %file.display(), code = e.code(), error = %e, "Extraction failed");
            all_ok = false;
        }
        outputs.push(file_output(&result)?);
    }

    let stats = pipeline.ocr_cache().stats();
    tracing::debug!(hits = stats.hits, misses = stats.misses, "OCR cache");
    pipeline.shutdown().context("Failed to shut down extraction engines")?;

    let output = if outputs.len() == 1 {
        outputs.remove(0)
    } else {
        serde_json::Value::Array(outputs)
    };
    println!("{}", to_json(&output, args.pretty)?);

    Ok(all_ok)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract(args) => {
            if !run_extract(args).await? {
                std::process::exit(1);
            }
        }
        Command::Config { config } => {
            let options = load_options(config.as_ref())?;
            let value = serde_json::to_value(&options).context("Failed to serialize options")?;
            println!("{}", to_json(&value, true)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ExtractArgs {
        let cli = Cli::try_parse_from(std::iter::once("pdf-harvest").chain(args.iter().copied())).unwrap();
        match cli.command {
            Command::Extract(args) => args,
            Command::Config { .. } => panic!("expected extract"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "extract",
            "a.pdf",
            "--pages",
            "1-3",
            "--ocr",
            "--language-handling",
            "multiple",
            "--additional-languages",
            "fra,deu",
            "--correct",
            "aggressive",
            "--fields",
            "--categories",
            "invoice, receipt",
            "--chunk-size",
            "5",
        ]);
        let mut options = ProcessingOptions::default();
        args.apply(&mut options);

        assert_eq!(options.pages.page_range.as_deref(), Some("1-3"));
        assert!(options.features.perform_ocr);
        assert_eq!(options.ocr.language_handling, LanguageHandling::Multiple);
        assert_eq!(options.ocr.additional_languages, vec!["fra", "deu"]);
        assert!(options.ocr.enhance_results);
        assert_eq!(options.ocr.correction_level, CorrectionLevel::Aggressive);
        assert!(options.recognition.detect_document_type);
        assert!(options.recognition.extract_form_fields);
        assert_eq!(options.recognition.categories, vec!["invoice", "receipt"]);
        assert!(options.performance.process_in_chunks);
        assert_eq!(options.performance.chunk_size, 5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_unset_flags_keep_loaded_options() {
        let args = parse(&["extract", "a.pdf"]);
        let mut options = ProcessingOptions::default();
        options.features.extract_tables = true;
        options.ocr.language = "deu".to_string();
        args.apply(&mut options);

        assert!(options.features.extract_tables);
        assert!(options.features.extract_text);
        assert_eq!(options.ocr.language, "deu");
        assert!(!options.performance.process_in_chunks);
    }

    #[test]
    fn test_error_json_carries_code() {
        let json = error_json(&HarvestError::PageOutOfRange { page: 9, total: 3 });
        assert_eq!(json["code"], "ERR_INVALID_PAGE_RANGE");
        assert!(json["error"].as_str().unwrap().contains("page 9"));
    }

    #[test]
    fn test_file_input_is_required() {
        assert!(Cli::try_parse_from(["pdf-harvest", "extract"]).is_err());
    }
}
