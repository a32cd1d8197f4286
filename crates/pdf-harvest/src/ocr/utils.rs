use ahash::AHasher;
use std::hash::{Hash, Hasher};

/// Rasterization scale used for OCR when neither quality nor scale is configured.
pub const DEFAULT_OCR_SCALE: f32 = 2.0;

/// Scale of the low-resolution render used as a language-detection sample.
pub const SAMPLE_SCALE: f32 = 1.0;

/// Accumulated text length after which auto-detection is re-run on later pages.
pub const REDETECT_TEXT_THRESHOLD: usize = 500;

/// Compute a hash string from input data
pub fn compute_hash(data: &str) -> String {
    let mut hasher = AHasher::default();
    data.hash(&mut hasher);
    let hash = hasher.finish();
    format!("{:016x}", hash)
}

/// Compute a hash string from raw bytes, e.g. a rendered page image.
pub fn compute_bytes_hash(data: &[u8]) -> String {
    let mut hasher = AHasher::default();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Join language codes into the `+`-separated form OCR engines accept.
pub fn join_languages(languages: &[String]) -> String {
    languages.join("+")
}

/// Marker written before each page of OCR output.
pub fn page_marker(page: u32, text: &str) -> String {
    format!("=== Page {} ===\n{}\n\n", page, text)
}
