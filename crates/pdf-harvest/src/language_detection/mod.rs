//! Heuristic language detection for OCR language selection.
//!
//! Detection counts script and diacritic characters per candidate language and
//! picks the language with the most matches. It is deterministic and offline,
//! not a statistical model: text without any distinctive characters is reported
//! as English.
//!
//! # Example
//!
//! ```rust
//! use pdf_harvest::language_detection::{detect_language, map_to_engine_code};
//!
//! assert_eq!(detect_language("The quick brown fox jumps over the lazy dog"), "eng");
//! assert_eq!(map_to_engine_code("zho"), "chi_sim");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Fallback language for short or signal-free text.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Text shorter than this many characters is never analyzed.
pub const MIN_DETECTION_LENGTH: usize = 10;

/// Paragraphs of this many characters or fewer are ignored by [`language_stats`].
pub const MIN_PARAGRAPH_LENGTH: usize = 30;

static LANGUAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("vie", r"[ăâđêôơưĂÂĐÊÔƠƯ]"),
        ("fra", r"[éèêàùëïçÉÈÊÀÙËÏÇ]"),
        ("deu", r"[äöüßÄÖÜ]"),
        ("spa", r"[áéíóúñÁÉÍÓÚÑ¿¡]"),
        ("jpn", r"[\x{3040}-\x{309F}\x{30A0}-\x{30FF}]"),
        ("zho", r"[\x{4E00}-\x{9FFF}]"),
        ("kor", r"[\x{AC00}-\x{D7AF}\x{1100}-\x{11FF}]"),
        ("rus", r"[а-яА-ЯёЁ]"),
        ("tha", r"[\x{0E00}-\x{0E7F}]"),
    ]
    .into_iter()
    .map(|(lang, pattern)| {
        (
            lang,
            Regex::new(pattern).expect("Language pattern is valid and should compile"),
        )
    })
    .collect()
});

static PARAGRAPH_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("Paragraph split regex pattern is valid and should compile"));

/// ISO 639-3 code, ISO 639-1 code and English name of the languages detection knows about.
const LANGUAGE_DATA: &[(&str, &str, &str)] = &[
    ("eng", "en", "English"),
    ("vie", "vi", "Vietnamese"),
    ("fra", "fr", "French"),
    ("deu", "de", "German"),
    ("spa", "es", "Spanish"),
    ("zho", "zh", "Chinese"),
    ("jpn", "ja", "Japanese"),
    ("kor", "ko", "Korean"),
    ("rus", "ru", "Russian"),
    ("tha", "th", "Thai"),
];

/// Score `text` against every candidate language.
///
/// Returns `None` when the text is too short or no candidate scored. Ties go
/// to the candidate listed first.
pub fn detect_signal(text: &str) -> Option<&'static str> {
    if text.chars().count() < MIN_DETECTION_LENGTH {
        return None;
    }

    let mut best: Option<(&'static str, usize)> = None;
    for (lang, pattern) in LANGUAGE_PATTERNS.iter() {
        let score = pattern.find_iter(text).count();
        if score > 0 && best.is_none_or(|(_, high)| score > high) {
            best = Some((lang, score));
        }
    }

    best.map(|(lang, _)| lang)
}

/// Detect the language of `text` as an ISO 639-3 code, defaulting to `eng`.
pub fn detect_language(text: &str) -> &'static str {
    detect_signal(text).unwrap_or(DEFAULT_LANGUAGE)
}

/// Map an ISO 639 code onto the OCR engine's language code. Unknown codes map to `eng`.
pub fn map_to_engine_code(code: &str) -> &'static str {
    let normalized = code.trim().to_lowercase();
    match normalized.as_str() {
        "eng" => "eng",
        "vie" => "vie",
        "fra" => "fra",
        "deu" => "deu",
        "ita" => "ita",
        "spa" => "spa",
        "por" => "por",
        "rus" => "rus",
        "jpn" => "jpn",
        "kor" => "kor",
        "hin" => "hin",
        "ben" => "ben",
        "dan" => "dan",
        "nld" => "nld",
        "fin" => "fin",
        "ell" => "ell",
        "hun" => "hun",
        "ind" => "ind",
        "nor" => "nor",
        "pol" => "pol",
        "ron" => "ron",
        "swe" => "swe",
        "tur" => "tur",
        "ukr" => "ukr",
        "heb" => "heb",
        "tha" => "tha",
        "tam" => "tam",
        "urd" => "urd",
        "ces" => "ces",
        "chi" | "zho" | "cmn" => "chi_sim",
        "yue" => "chi_tra",
        "ara" | "arb" => "ara",
        _ => DEFAULT_LANGUAGE,
    }
}

/// Percentage of paragraphs per engine language code.
///
/// Paragraphs are separated by blank lines; only those longer than
/// [`MIN_PARAGRAPH_LENGTH`] characters count. Returns `{eng: 100}` when nothing qualifies.
pub fn language_stats(text: &str) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;

    for paragraph in PARAGRAPH_SPLIT.split(text) {
        if paragraph.trim().chars().count() <= MIN_PARAGRAPH_LENGTH {
            continue;
        }
        let code = map_to_engine_code(detect_language(paragraph));
        *counts.entry(code.to_string()).or_default() += 1;
        total += 1;
    }

    if total == 0 {
        return BTreeMap::from([(DEFAULT_LANGUAGE.to_string(), 100)]);
    }

    counts
        .into_iter()
        .map(|(lang, count)| (lang, ((count as f64 / total as f64) * 100.0).round() as u32))
        .collect()
}

/// English name of an ISO 639-3 code, or `Unknown`.
pub fn language_name(iso639_3: &str) -> &'static str {
    LANGUAGE_DATA
        .iter()
        .find(|(code, _, _)| *code == iso639_3)
        .map(|(_, _, name)| *name)
        .unwrap_or("Unknown")
}

/// ISO 639-1 code of an ISO 639-3 code, defaulting to `en`.
pub fn iso639_1(iso639_3: &str) -> &'static str {
    LANGUAGE_DATA
        .iter()
        .find(|(code, _, _)| *code == iso639_3)
        .map(|(_, short, _)| *short)
        .unwrap_or("en")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_english() {
        assert_eq!(detect_language("This is a plain English sentence about invoices."), "eng");
    }

    #[test]
    fn test_detect_vietnamese() {
        assert_eq!(
            detect_language("Tôi đang học tiếng Việt ở trường đại học, ăn cơm với bạn bè."),
            "vie"
        );
    }

    #[test]
    fn test_detect_other_scripts() {
        assert_eq!(detect_language("Привет, как у тебя дела сегодня?"), "rus");
        assert_eq!(detect_language("これはテストです。ひらがなとカタカナ"), "jpn");
        assert_eq!(detect_language("Straße, Größe, Übermäßig schön"), "deu");
    }

    #[test]
    fn test_short_text_falls_back() {
        assert_eq!(detect_signal("đăng"), None);
        assert_eq!(detect_language("đăng"), "eng");
        assert_eq!(detect_language(""), "eng");
    }

    #[test]
    fn test_no_signal_is_none() {
        assert_eq!(detect_signal("plain ascii text with no diacritics"), None);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let text = "Le café est très bon à Paris, n'est-ce pas? Où est la gare?";
        let first = detect_language(text);
        for _ in 0..10 {
            assert_eq!(detect_language(text), first);
        }
        assert_eq!(first, "fra");
    }

    #[test]
    fn test_map_to_engine_code() {
        assert_eq!(map_to_engine_code("eng"), "eng");
        assert_eq!(map_to_engine_code(" ZHO "), "chi_sim");
        assert_eq!(map_to_engine_code("cmn"), "chi_sim");
        assert_eq!(map_to_engine_code("yue"), "chi_tra");
        assert_eq!(map_to_engine_code("arb"), "ara");
        assert_eq!(map_to_engine_code("xyz"), "eng");
        assert_eq!(map_to_engine_code(""), "eng");
    }

    #[test]
    fn test_language_stats_mixed() {
        let text = "This paragraph is written entirely in plain English words.\n\n\
                    Ce paragraphe est écrit en français, avec des accents très élégants.";
        let stats = language_stats(text);
        assert_eq!(stats.get("eng"), Some(&50));
        assert_eq!(stats.get("fra"), Some(&50));
    }

    #[test]
    fn test_language_stats_defaults_to_english() {
        let stats = language_stats("short\n\ntext");
        assert_eq!(stats, BTreeMap::from([("eng".to_string(), 100)]));
        assert_eq!(language_stats(""), BTreeMap::from([("eng".to_string(), 100)]));
    }

    #[test]
    fn test_language_name_and_iso639_1() {
        assert_eq!(language_name("vie"), "Vietnamese");
        assert_eq!(language_name("xyz"), "Unknown");
        assert_eq!(iso639_1("deu"), "de");
        assert_eq!(iso639_1("xyz"), "en");
    }
}
