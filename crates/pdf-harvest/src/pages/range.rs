//! Page-range expressions.
//!
//! An expression is a comma-separated list of tokens, each either a single
//! 1-based page number (`5`) or an inclusive range (`7-9`). Whitespace around
//! tokens is ignored.

use crate::{HarvestError, Result};
use std::collections::BTreeSet;

/// Parse a page-range expression into ascending, deduplicated page numbers.
///
/// An empty (or all-whitespace) expression yields an empty list; substituting
/// the full `1..=total` range is up to the caller, which knows the page count.
/// Every page of every span is materialized; use [`resolve_pages`] when the
/// page count is known, which rejects out-of-range spans before expanding.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidRangeFormat`] when a token is not an integer,
/// a number is zero or negative, or a range has `start > end`.
///
/// # Example
///
/// ```rust
/// use pdf_harvest::pages::parse_page_range;
///
/// let pages = parse_page_range("1-3,5,7-9").unwrap();
/// assert_eq!(pages, vec![1, 2, 3, 5, 7, 8, 9]);
/// ```
pub fn parse_page_range(expression: &str) -> Result<Vec<u32>> {
    Ok(expand(&parse_spans(expression)?))
}

/// Validated inclusive `(start, end)` spans, in expression order.
fn parse_spans(expression: &str) -> Result<Vec<(u32, u32)>> {
    let mut spans = Vec::new();

    for token in expression.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }

        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start, token)?;
                let end = parse_page_number(end, token)?;
                if start > end {
                    return Err(HarvestError::InvalidRangeFormat(format!(
                        "range '{}' starts after it ends",
                        token
                    )));
                }
                spans.push((start, end));
            }
            None => {
                let page = parse_page_number(token, token)?;
                spans.push((page, page));
            }
        }
    }

    Ok(spans)
}

fn expand(spans: &[(u32, u32)]) -> Vec<u32> {
    let pages: BTreeSet<u32> = spans.iter().flat_map(|&(start, end)| start..=end).collect();
    pages.into_iter().collect()
}

fn parse_page_number(raw: &str, token: &str) -> Result<u32> {
    let raw = raw.trim();
    let value: i64 = raw
        .parse()
        .map_err(|_| HarvestError::InvalidRangeFormat(format!("'{}' is not a valid page number in '{}'", raw, token)))?;

    if value <= 0 {
        return Err(HarvestError::InvalidRangeFormat(format!(
            "page numbers must be positive, got {} in '{}'",
            value, token
        )));
    }

    u32::try_from(value)
        .map_err(|_| HarvestError::InvalidRangeFormat(format!("page number {} is out of bounds", value)))
}

/// Resolve the active page selection against the document's page count.
///
/// - `first_page_only` keeps only the first page of the selection (or page 1).
/// - An empty or missing expression selects every page.
///
/// # Errors
///
/// Propagates [`parse_page_range`] failures and returns
/// [`HarvestError::PageOutOfRange`] when the largest requested page exceeds
/// `total_pages`.
pub fn resolve_pages(expression: Option<&str>, first_page_only: bool, total_pages: u32) -> Result<Vec<u32>> {
    let mut pages = match expression.map(str::trim).filter(|e| !e.is_empty()) {
        Some(expr) => {
            let spans = parse_spans(expr)?;
            // Checked on the spans: expanding a huge end page first would allocate every page number.
            if let Some(max) = spans.iter().map(|&(_, end)| end).max()
                && max > total_pages
            {
                return Err(HarvestError::PageOutOfRange {
                    page: max,
                    total: total_pages,
                });
            }
            expand(&spans)
        }
        None => (1..=total_pages).collect(),
    };

    if first_page_only {
        pages.truncate(1);
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_expression() {
        let pages = parse_page_range("1-3,5,7-9").unwrap();
        assert_eq!(pages, vec![1, 2, 3, 5, 7, 8, 9]);
        assert_eq!(pages.len(), 7);
    }

    #[test]
    fn test_parse_with_whitespace() {
        let pages = parse_page_range(" 1 - 2 , 8, 11-13 ").unwrap();
        assert_eq!(pages, vec![1, 2, 8, 11, 12, 13]);
    }

    #[test]
    fn test_parse_overlapping_ranges_are_deduplicated() {
        let pages = parse_page_range("1-4,3-6,2").unwrap();
        assert_eq!(pages, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_output_is_strictly_increasing() {
        let pages = parse_page_range("9,1,5-6,3").unwrap();
        assert!(pages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_single_page_range() {
        assert_eq!(parse_page_range("4-4").unwrap(), vec![4]);
    }

    #[test]
    fn test_parse_empty_expression() {
        assert!(parse_page_range("").unwrap().is_empty());
        assert!(parse_page_range("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_reversed_range_fails() {
        let err = parse_page_range("5-3").unwrap_err();
        assert!(matches!(err, HarvestError::InvalidRangeFormat(_)));
    }

    #[test]
    fn test_parse_non_numeric_fails() {
        let err = parse_page_range("a-5").unwrap_err();
        assert!(matches!(err, HarvestError::InvalidRangeFormat(_)));

        let err = parse_page_range("1,two,3").unwrap_err();
        assert!(matches!(err, HarvestError::InvalidRangeFormat(_)));
    }

    #[test]
    fn test_parse_zero_and_negative_fail() {
        assert!(matches!(
            parse_page_range("0").unwrap_err(),
            HarvestError::InvalidRangeFormat(_)
        ));
        assert!(matches!(
            parse_page_range("0-2").unwrap_err(),
            HarvestError::InvalidRangeFormat(_)
        ));
        assert!(matches!(
            parse_page_range("-3").unwrap_err(),
            HarvestError::InvalidRangeFormat(_)
        ));
    }

    #[test]
    fn test_parse_dangling_dash_fails() {
        assert!(parse_page_range("3-").is_err());
    }

    #[test]
    fn test_resolve_defaults_to_all_pages() {
        assert_eq!(resolve_pages(None, false, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(resolve_pages(Some(""), false, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let err = resolve_pages(Some("1-3,12"), false, 5).unwrap_err();
        match err {
            HarvestError::PageOutOfRange { page, total } => {
                assert_eq!(page, 12);
                assert_eq!(total, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_huge_upper_bound_fails_without_expanding() {
        let err = resolve_pages(Some("2,1-4000000000"), false, 3).unwrap_err();
        assert!(matches!(
            err,
            HarvestError::PageOutOfRange {
                page: 4_000_000_000,
                total: 3
            }
        ));

        let err = resolve_pages(Some("1-4294967295"), true, 10).unwrap_err();
        assert!(matches!(err, HarvestError::PageOutOfRange { page: u32::MAX, .. }));
    }

    #[test]
    fn test_resolve_validates_every_token_before_bounds() {
        let err = resolve_pages(Some("1-99,x"), false, 3).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidRangeFormat(_)));
    }

    #[test]
    fn test_resolve_first_page_only() {
        assert_eq!(resolve_pages(None, true, 9).unwrap(), vec![1]);
        assert_eq!(resolve_pages(Some("4-6"), true, 9).unwrap(), vec![4]);
    }

    #[test]
    fn test_resolve_empty_document() {
        assert!(resolve_pages(None, false, 0).unwrap().is_empty());
    }
}
