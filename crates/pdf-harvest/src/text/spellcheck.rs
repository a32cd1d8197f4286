//! Word-list spellchecker.
//!
//! A dictionary is a plain list of words per ISO 639-1 language, most common
//! first. Lookup is case-insensitive. Suggestions are dictionary words within
//! [`MAX_SUGGESTION_DISTANCE`] edits, ordered by distance and then by list
//! position, with the capitalization of the input word carried over.
//!
//! English ships with the crate; other languages are added with
//! [`DictionarySpellChecker::with_words`] or loaded from a one-word-per-line file.

use super::distance::levenshtein_distance;
use crate::plugins::{Plugin, SpellChecker};
use crate::{HarvestError, Result};
use ahash::AHashMap;
use std::path::Path;

const ENGLISH_WORDS: &str = include_str!("../../data/en_words.txt");

/// Words further than this many edits are never suggested.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Suggestions returned per word.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Default)]
struct Dictionary {
    /// Lowercased word to its rank in the source list.
    ranks: AHashMap<String, usize>,
    words: Vec<String>,
}

impl Dictionary {
    fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::default();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if word.is_empty() || word.starts_with('#') || dictionary.ranks.contains_key(&word) {
                continue;
            }
            dictionary.ranks.insert(word.clone(), dictionary.words.len());
            dictionary.words.push(word);
        }
        dictionary
    }

    fn contains(&self, word: &str) -> bool {
        self.ranks.contains_key(&word.to_lowercase())
    }

    fn suggestions(&self, word: &str) -> Vec<String> {
        let lowered = word.to_lowercase();
        let length = lowered.chars().count();

        let mut candidates: Vec<(usize, usize, &str)> = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.chars().count().abs_diff(length) <= MAX_SUGGESTION_DISTANCE)
            .filter_map(|(rank, candidate)| {
                let distance = levenshtein_distance(&lowered, candidate);
                (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, rank, candidate.as_str()))
            })
            .collect();
        candidates.sort_unstable();

        candidates
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, _, candidate)| match_case(word, candidate))
            .collect()
    }
}

/// Carry the capitalization pattern of `original` over to `suggestion`.
fn match_case(original: &str, suggestion: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return suggestion.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = suggestion.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    suggestion.to_string()
}

/// In-memory [`SpellChecker`] backed by word lists.
#[derive(Debug)]
pub struct DictionarySpellChecker {
    dictionaries: AHashMap<String, Dictionary>,
}

impl DictionarySpellChecker {
    /// Checker with the bundled English dictionary.
    pub fn new() -> Self {
        Self::empty().with_words("en", ENGLISH_WORDS.lines())
    }

    /// Checker without any dictionary.
    pub fn empty() -> Self {
        Self {
            dictionaries: AHashMap::new(),
        }
    }

    /// Add or replace the dictionary for `language`.
    pub fn with_words<I, S>(mut self, language: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dictionaries
            .insert(language.to_lowercase(), Dictionary::from_words(words));
        self
    }

    /// Add the dictionary for `language` from a one-word-per-line file.
    /// Blank lines and lines starting with `#` are ignored.
    pub fn with_word_file(self, language: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::validation_with_source(
                format!("Failed to read word list {}", path.display()),
                e,
            )
        })?;
        Ok(self.with_words(language, content.lines()))
    }

    /// Languages with a loaded dictionary, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.dictionaries.keys().cloned().collect();
        languages.sort();
        languages
    }
}

impl Default for DictionarySpellChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DictionarySpellChecker {
    fn name(&self) -> &str {
        "dictionary-spellcheck"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Word-list spellchecker with edit-distance suggestions"
    }
}

impl SpellChecker for DictionarySpellChecker {
    fn supports(&self, language: &str) -> bool {
        self.dictionaries.contains_key(&language.to_lowercase())
    }

    fn is_misspelled(&self, word: &str, language: &str) -> bool {
        self.dictionaries
            .get(&language.to_lowercase())
            .is_some_and(|dictionary| !dictionary.contains(word))
    }

    fn suggestions(&self, word: &str, language: &str) -> Vec<String> {
        self.dictionaries
            .get(&language.to_lowercase())
            .map(|dictionary| dictionary.suggestions(word))
            .unwrap_or_default()
    }
}
