//! Spellchecker trait.

use crate::plugins::Plugin;

/// Adapter over a dictionary-based spellchecker.
pub trait SpellChecker: Plugin {
    /// Whether the checker has a dictionary for the ISO 639-1 `language`.
    fn supports(&self, language: &str) -> bool;

    /// `true` when `word` is not in the dictionary for `language`.
    fn is_misspelled(&self, word: &str, language: &str) -> bool;

    /// Replacement candidates, best first.
    fn suggestions(&self, word: &str, language: &str) -> Vec<String>;
}
