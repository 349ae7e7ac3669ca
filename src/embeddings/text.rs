//! Text cleanup before vectorization

use crate::errors::LightNaviError;
use crate::errors::Result;

/// Maximum characters sent to the embeddings endpoint per input
pub const MAX_EMBEDDING_CHARS: usize = 8000;

/// Collapse whitespace runs, drop control characters and cap the length
///
/// # Errors
/// Returns `EmbeddingError` when nothing but whitespace remains.
pub fn preprocess_text_for_embedding(text: &str) -> Result<String> {
    let cleaned: String = text
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        return Err(LightNaviError::EmbeddingError(
            "text is empty after preprocessing".to_string(),
        ));
    }

    Ok(cleaned.chars().take(MAX_EMBEDDING_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        let text = preprocess_text_for_embedding("  汎用ダウンライト\n用途:\t事務所,  会議室 ").unwrap();
        assert_eq!(text, "汎用ダウンライト 用途: 事務所, 会議室");
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(preprocess_text_for_embedding("a\u{0}b c").unwrap(), "ab c");
    }

    #[test]
    fn test_blank_is_error() {
        assert!(preprocess_text_for_embedding(" \n\t ").is_err());
    }

    #[test]
    fn test_long_text_is_capped() {
        let text = "照".repeat(MAX_EMBEDDING_CHARS + 10);
        let processed = preprocess_text_for_embedding(&text).unwrap();
        assert_eq!(processed.chars().count(), MAX_EMBEDDING_CHARS);
    }
}
