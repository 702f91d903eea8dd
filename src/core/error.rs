use std::fmt;

use thiserror::Error;

use crate::messages::ErrorObject;

/// Errors raised while projecting JSON into typed records and unions.
///
/// Every variant is deterministic: the same payload always produces the same
/// error, so none of them are worth retrying.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    #[error("required field `{0}` was null")]
    RequiredFieldWasNull(String),

    #[error("field `{key}` is not a valid {expected}: {source}")]
    MalformedField {
        key: String,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "no variant of {union} matched discriminator {}{}",
        DisplayDiscriminator(.discriminator.as_deref()),
        DisplayAttempts(.attempts)
    )]
    NoMatchingVariant {
        union: &'static str,
        discriminator: Option<String>,
        attempts: Vec<VariantAttempt>,
    },

    #[error(
        "{union} holds an unrecognized variant (discriminator {})",
        DisplayDiscriminator(.discriminator.as_deref())
    )]
    UnknownVariantRejected {
        union: &'static str,
        discriminator: Option<String>,
    },

    #[error("value is not a valid {expected}: {source}")]
    InvalidShape {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected `type` to be `{expected}`, found `{found}`")]
    TagMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("`{value}` cannot be used as the `{key}` path segment")]
    InvalidPathSegment { key: String, value: String },

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    /// Key of the offending field, for field-level errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            DataError::MissingRequiredField(key) | DataError::RequiredFieldWasNull(key) => {
                Some(key)
            }
            DataError::MalformedField { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Attempts recorded by a failed union decode. Empty for every other error.
    pub fn attempts(&self) -> &[VariantAttempt] {
        match self {
            DataError::NoMatchingVariant { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

/// One candidate a union engine tried, and why it was rejected.
#[derive(Debug)]
pub struct VariantAttempt {
    pub variant: &'static str,
    pub cause: Box<DataError>,
}

impl VariantAttempt {
    pub fn new(variant: &'static str, cause: DataError) -> Self {
        Self {
            variant,
            cause: Box::new(cause),
        }
    }
}

impl fmt::Display for VariantAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variant, self.cause)
    }
}

struct DisplayDiscriminator<'a>(Option<&'a str>);

impl fmt::Display for DisplayDiscriminator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(tag) => write!(f, "`{tag}`"),
            None => f.write_str("none"),
        }
    }
}

struct DisplayAttempts<'a>(&'a [VariantAttempt]);

impl fmt::Display for DisplayAttempts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(" (tried ")?;
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{attempt}")?;
        }
        f.write_str(")")
    }
}

/// Errors surfaced by the client seam: transport, API and data failures.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("API error{}: {message}", .status_code.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        message: String,
        status_code: Option<u16>,
        error: Option<ErrorObject>,
        /// `request_id` of the error envelope, for tracing a failure with support.
        request_id: Option<String>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),

    #[error("Stream error: {message}")]
    Stream { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_variant_lists_every_attempt() {
        let err = DataError::NoMatchingVariant {
            union: "WebSearchToolResultContent",
            discriminator: None,
            attempts: vec![
                VariantAttempt::new("Error", DataError::NotAnObject { found: "array" }),
                VariantAttempt::new(
                    "Results",
                    DataError::MissingRequiredField("url".to_string()),
                ),
            ],
        };

        let message = err.to_string();
        assert!(message.contains("discriminator none"));
        assert!(message.contains("Error: expected a JSON object, found array"));
        assert!(message.contains("Results: missing required field `url`"));
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn field_errors_expose_their_key() {
        assert_eq!(
            DataError::RequiredFieldWasNull("text".into()).field(),
            Some("text")
        );
        assert_eq!(DataError::NotAnObject { found: "string" }.field(), None);
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = LlmError::Api {
            message: "overloaded".to_string(),
            status_code: Some(529),
            error: None,
            request_id: None,
        };
        assert_eq!(err.to_string(), "API error (529): overloaded");
    }
}
