use super::error::OcrError;

/// Language data packs shipped with Tesseract, sorted for binary search.
pub const TESSERACT_SUPPORTED_LANGUAGE_CODES: &[&str] = &[
    "afr", "amh", "ara", "asm", "aze", "aze_cyrl", "bel", "ben", "bod", "bos", "bre", "bul",
    "cat", "ceb", "ces", "chi_sim", "chi_tra", "chr", "cos", "cym", "dan", "deu", "div", "dzo",
    "ell", "eng", "enm", "epo", "equ", "est", "eus", "fao", "fas", "fil", "fin", "fra", "frk",
    "frm", "fry", "gla", "gle", "glg", "grc", "guj", "hat", "heb", "hin", "hrv", "hun", "hye",
    "iku", "ind", "isl", "ita", "ita_old", "jav", "jpn", "kan", "kat", "kat_old", "kaz", "khm",
    "kir", "kmr", "kor", "lao", "lat", "lav", "lit", "ltz", "mal", "mar", "mkd", "mlt", "mon",
    "mri", "msa", "mya", "nep", "nld", "nor", "oci", "ori", "osd", "pan", "pol", "por", "pus",
    "que", "ron", "rus", "san", "sin", "slk", "slv", "snd", "spa", "spa_old", "sqi", "srp",
    "srp_latn", "sun", "swa", "swe", "syr", "tam", "tat", "tel", "tgk", "tha", "tir", "ton",
    "tur", "uig", "ukr", "urd", "uzb", "uzb_cyrl", "vie", "yid", "yor",
];

pub fn is_supported_language(code: &str) -> bool {
    TESSERACT_SUPPORTED_LANGUAGE_CODES.binary_search(&code).is_ok()
}

/// Check every code of a language set; the set itself must not be empty.
pub fn validate_languages(languages: &[String]) -> Result<(), OcrError> {
    if languages.is_empty() {
        return Err(OcrError::InvalidLanguageCode("No OCR language given".to_string()));
    }

    for code in languages.iter().flat_map(|l| l.split('+')) {
        if !is_supported_language(code) {
            return Err(OcrError::InvalidLanguageCode(format!(
                "Language code '{}' is not supported by Tesseract",
                code
            )));
        }
    }
    Ok(())
}
