//! OCR post-correction.
//!
//! Correction always starts by stripping control characters and collapsing
//! runs of horizontal whitespace. What follows depends on the level:
//!
//! - `Light` rewrites well-known character confusions, but only when the
//!   suspicious sequence sits between two ASCII letters, so numbers survive.
//! - `Medium` replaces misspelled words with the checker's top suggestion
//!   when it is similar enough to the original word.
//! - `Aggressive` lowers the similarity bar and, for English, also tidies
//!   punctuation spacing, sentence capitalization and the pronoun "I".
//!
//! Correction never fails: if the spellchecker panics the input is returned.

use super::distance::string_similarity;
use crate::core::config::CorrectionLevel;
use crate::plugins::SpellChecker;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// ISO 639-1 codes eligible for dictionary correction.
pub const SPELLCHECK_LANGUAGES: [&str; 7] = ["en", "fr", "de", "es", "pt", "it", "nl"];

/// Minimum suggestion similarity at `Medium`.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;

/// Minimum suggestion similarity at `Aggressive`.
pub const AGGRESSIVE_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Confusions fixed at `Light`, applied in this order.
const CHARACTER_CONFUSIONS: &[(&str, &str)] = &[
    ("0", "O"),
    ("1", "I"),
    ("5", "S"),
    ("8", "B"),
    ("O0", "OO"),
    ("0O", "OO"),
    ("l", "I"),
    ("|", "I"),
    ("rn", "m"),
    ("cl", "d"),
    ("vv", "w"),
    ("ii", "n"),
];

static CONFUSION_PATTERNS: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    CHARACTER_CONFUSIONS
        .iter()
        .map(|(from, to)| {
            let pattern = format!("([a-zA-Z]){}([a-zA-Z])", regex::escape(from));
            (
                Regex::new(&pattern).expect("Confusion regex pattern is valid and should compile"),
                format!("${{1}}{}${{2}}", to),
            )
        })
        .collect()
});

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x09\x0B\x0C\x0E-\x1F\x7F]").expect("Control character regex pattern is valid and should compile")
});
static HORIZONTAL_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\r\n]+").expect("Whitespace regex pattern is valid and should compile"));
// ASCII classes: accented or non-Latin letters count as punctuation, so such
// words are never handed to the checker.
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").expect("Digit regex pattern is valid and should compile"));
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_\s]").expect("Non-word regex pattern is valid and should compile"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,;:!?])").expect("Punctuation spacing regex pattern is valid and should compile"));
static SENTENCE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?])\s+([a-z])").expect("Sentence start regex pattern is valid and should compile"));
static PRONOUN_I: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[iI]\b").expect("Pronoun regex pattern is valid and should compile"));

/// Corrects OCR output using a [`SpellChecker`].
pub struct OcrPostProcessor {
    spellchecker: Arc<dyn SpellChecker>,
}

impl OcrPostProcessor {
    pub fn new(spellchecker: Arc<dyn SpellChecker>) -> Self {
        Self { spellchecker }
    }

    /// Correct `text` for the ISO 639-1 `language` at `level`.
    pub fn correct(&self, text: &str, language: &str, level: CorrectionLevel) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let cleaned = normalize(text);

        let corrected = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match level {
            CorrectionLevel::Light => fix_confusions(&cleaned),
            CorrectionLevel::Medium | CorrectionLevel::Aggressive => {
                let mut out = if SPELLCHECK_LANGUAGES.contains(&language) && self.spellchecker.supports(language) {
                    self.spell_correct(&cleaned, language, level)
                } else {
                    cleaned.clone()
                };
                if level == CorrectionLevel::Aggressive && language == "en" {
                    out = tidy_english(&out);
                }
                out
            }
        }));

        match corrected {
            Ok(corrected) => corrected,
            Err(_) => {
                tracing::warn!(language, "OCR text correction failed, keeping original text");
                text.to_string()
            }
        }
    }

    /// Word-by-word dictionary correction. Line breaks are kept.
    fn spell_correct(&self, text: &str, language: &str, level: CorrectionLevel) -> String {
        let threshold = if level == CorrectionLevel::Aggressive {
            AGGRESSIVE_SIMILARITY_THRESHOLD
        } else {
            SIMILARITY_THRESHOLD
        };

        text.split('\n')
            .map(|line| {
                line.split(' ')
                    .map(|word| self.correct_word(word, language, threshold))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn correct_word(&self, word: &str, language: &str, threshold: f64) -> String {
        if word.chars().count() <= 2 || DIGIT.is_match(word) || NON_WORD.is_match(word) {
            return word.to_string();
        }
        if !self.spellchecker.is_misspelled(word, language) {
            return word.to_string();
        }

        match self.spellchecker.suggestions(word, language).into_iter().next() {
            Some(suggestion) if string_similarity(word, &suggestion) >= threshold => suggestion,
            _ => word.to_string(),
        }
    }
}

impl std::fmt::Debug for OcrPostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrPostProcessor")
            .field("spellchecker", &self.spellchecker.name())
            .finish()
    }
}

/// Strip control characters (line breaks excepted) and collapse horizontal whitespace.
pub fn normalize(text: &str) -> String {
    let stripped = CONTROL_CHARS.replace_all(text, "");
    HORIZONTAL_WHITESPACE.replace_all(&stripped, " ").into_owned()
}

/// Apply the letter-flanked confusion substitutions.
pub fn fix_confusions(text: &str) -> String {
    CONFUSION_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, replacement.as_str()).into_owned()
        })
}

fn tidy_english(text: &str) -> String {
    let spaced = SPACE_BEFORE_PUNCT.replace_all(text, "$1");
    let capitalized = SENTENCE_START.replace_all(&spaced, |caps: &regex::Captures| {
        format!("{} {}", &caps[1], caps[2].to_uppercase())
    });
    PRONOUN_I.replace_all(&capitalized, "I").into_owned()
}
