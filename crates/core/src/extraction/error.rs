//! Extraction adapter error types.

use thiserror::Error;

/// Errors that can occur while extracting structured data from an image.
///
/// The adapter itself never retries; callers use [`is_retryable`] to
/// decide. A wrong-but-well-formed structured answer will not change on
/// retry, so only transport-level failures are retryable.
///
/// [`is_retryable`]: ExtractionError::is_retryable
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The provider was unreachable, timed out, or returned a non-success
    /// status.
    #[error("Extraction service error: {0}")]
    Service(String),

    /// The response arrived but no JSON payload could be located in any
    /// known envelope.
    #[error("Extraction response could not be parsed: {0}")]
    Parse(String),

    /// The payload parsed but violated the receipt schema.
    #[error("Extraction payload failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ExtractionError {
    /// Returns true if the caller may reasonably retry the call.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Service(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_service_errors_retryable() {
        assert!(ExtractionError::Service("timeout".into()).is_retryable());
        assert!(!ExtractionError::Parse("garbage".into()).is_retryable());
        assert!(!ExtractionError::Validation(vec!["total: missing".into()]).is_retryable());
    }

    #[test]
    fn test_validation_display_joins_violations() {
        let err = ExtractionError::Validation(vec![
            "total: missing required field".to_string(),
            "items: expected an array".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Extraction payload failed validation: total: missing required field; items: expected an array"
        );
    }
}
