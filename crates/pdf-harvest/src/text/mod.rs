//! Text utilities for OCR post-processing.

pub mod correction;
pub mod distance;
pub mod spellcheck;

pub use correction::OcrPostProcessor;
pub use distance::{levenshtein_distance, string_similarity};
pub use spellcheck::DictionarySpellChecker;
