use crate::{HarvestError, Result};

/// Split `items` into consecutive batches of `size`, preserving order.
///
/// The last batch may be shorter. An empty input yields no batches.
///
/// # Errors
///
/// Returns [`HarvestError::Validation`] when `size` is zero.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Result<Vec<Vec<T>>> {
    if size == 0 {
        return Err(HarvestError::validation("chunk size must be greater than zero"));
    }

    Ok(items.chunks(size).map(<[T]>::to_vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_shorter_than_size() {
        assert_eq!(chunk(&[1, 2, 3], 5).unwrap(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_chunk_empty() {
        let empty: Vec<u32> = Vec::new();
        assert!(chunk(&empty, 3).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_concat_roundtrip_and_sizes() {
        let items: Vec<u32> = (1..=23).collect();
        for size in 1..=25 {
            let chunks = chunk(&items, size).unwrap();
            let flattened: Vec<u32> = chunks.iter().flatten().copied().collect();
            assert_eq!(flattened, items);

            let (last, rest) = chunks.split_last().unwrap();
            assert!(rest.iter().all(|c| c.len() == size));
            assert!(!last.is_empty() && last.len() <= size);
        }
    }

    #[test]
    fn test_chunk_zero_size_rejected() {
        let err = chunk(&[1, 2], 0).unwrap_err();
        assert!(matches!(err, HarvestError::Validation { .. }));
    }
}
