//! Word-boundary text chunker.
//!
//! Splits extracted document text into overlapping word windows. Splitting
//! is deterministic: the same input and parameters always produce the same
//! chunks, which is what makes incremental reindexing idempotent.

use crate::error::{EngineError, Result};

/// Split text into overlapping chunks of at most `chunk_size_words`
/// whitespace-delimited words, with consecutive chunks sharing
/// `overlap_words` words.
///
/// Empty or whitespace-only input yields no chunks. The final chunk is
/// kept even when shorter than `chunk_size_words`.
///
/// `overlap_words` must be smaller than `chunk_size_words`; otherwise the
/// window would never advance and this returns a configuration error.
pub fn split(text: &str, chunk_size_words: usize, overlap_words: usize) -> Result<Vec<String>> {
    if chunk_size_words == 0 {
        return Err(EngineError::Configuration(
            "chunk_size_words must be > 0".to_string(),
        ));
    }
    if overlap_words >= chunk_size_words {
        return Err(EngineError::Configuration(format!(
            "overlap_words ({}) must be smaller than chunk_size_words ({})",
            overlap_words, chunk_size_words
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let step = chunk_size_words - overlap_words;
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_windows_no_overlap() {
        let chunks = split("a b c d e", 2, 0).unwrap();
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split("", 10, 2).unwrap().is_empty());
        assert!(split("   \n\t  ", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_overlap_shares_words() {
        let chunks = split("a b c d e", 2, 1).unwrap();
        assert_eq!(chunks, vec!["a b", "b c", "c d", "d e"]);
    }

    #[test]
    fn test_final_short_chunk_kept() {
        let chunks = split("one two three four five six seven", 3, 0).unwrap();
        assert_eq!(chunks, vec!["one two three", "four five six", "seven"]);
    }

    #[test]
    fn test_single_chunk_when_under_size() {
        let chunks = split("hello world", 100, 10).unwrap();
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let err = split("a b c", 2, 2).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = split("a b c", 0, 0).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_deterministic() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let a = split(text, 3, 1).unwrap();
        let b = split(text, 3, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_collapses_mixed_whitespace() {
        let chunks = split("a\n b\t\tc   d", 2, 0).unwrap();
        assert_eq!(chunks, vec!["a b", "c d"]);
    }
}
