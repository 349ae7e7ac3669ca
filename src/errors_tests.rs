//! Unit tests for error handling
//!
//! Tests error types, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use crate::errors::LightNaviError;

    // ====== Error Type Tests ======

    #[test]
    fn test_config_error() {
        let error = LightNaviError::ConfigError("final_cap must be positive".to_string());
        assert!(matches!(error, LightNaviError::ConfigError(_)));
        let display = format!("{}", error);
        assert!(display.contains("Configuration"));
        assert!(display.contains("final_cap"));
    }

    #[test]
    fn test_embedding_error() {
        let error = LightNaviError::EmbeddingError("quota exceeded".to_string());
        assert_eq!(format!("{}", error), "Embedding error: quota exceeded");
    }

    #[test]
    fn test_llm_error() {
        let error = LightNaviError::LlmError("API call failed".to_string());
        assert!(matches!(error, LightNaviError::LlmError(_)));
    }

    #[test]
    fn test_timeout_error_mentions_duration() {
        let error = LightNaviError::Timeout(Duration::from_secs(3));
        let display = format!("{}", error);
        assert!(display.contains("timed out"));
        assert!(display.contains("3s"));
    }

    #[test]
    fn test_invalid_argument() {
        let error = LightNaviError::InvalidArgument("final_cap must be at least 1".to_string());
        assert!(format!("{}", error).starts_with("Invalid argument"));
    }

    // ====== Error Conversion Tests ======

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: LightNaviError = io_err.into();

        match err {
            LightNaviError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_result: Result<serde_json::Value, _> = serde_json::from_str("{invalid json}");

        if let Err(json_err) = parse_result {
            let err: LightNaviError = json_err.into();
            assert!(matches!(err, LightNaviError::Serialization(_)));
        }
    }

    #[test]
    fn test_error_from_toml() {
        let parse_result: Result<toml::Value, _> = toml::from_str("[database\nurl=");
        let err: LightNaviError = parse_result.unwrap_err().into();
        assert!(matches!(err, LightNaviError::TomlParsing(_)));
    }

    #[test]
    fn test_error_from_sqlx() {
        let err: LightNaviError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, LightNaviError::Database(_)));
        assert!(format!("{}", err).starts_with("Database error"));
    }

    // ====== Result Type Tests ======

    #[test]
    fn test_result_and_then() {
        let result: crate::Result<usize> = Ok(10);
        let chained = result.and_then(|cap| {
            if cap > 0 {
                Ok(cap * 2)
            } else {
                Err(LightNaviError::InvalidArgument("zero cap".to_string()))
            }
        });
        assert_eq!(chained.unwrap(), 20);
    }
}
