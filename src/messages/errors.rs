//! Error payloads returned by the API.

use crate::core::error::DataError;
use crate::core::record::Record;
use crate::{record, union};

#[record(tag = "invalid_request_error")]
pub struct InvalidRequestError {
    pub message: String,
}

#[record(tag = "authentication_error")]
pub struct AuthenticationError {
    pub message: String,
}

#[record(tag = "billing_error")]
pub struct BillingError {
    pub message: String,
}

#[record(tag = "permission_error")]
pub struct PermissionError {
    pub message: String,
}

#[record(tag = "not_found_error")]
pub struct NotFoundError {
    pub message: String,
}

#[record(tag = "request_too_large")]
pub struct RequestTooLargeError {
    pub message: String,
}

#[record(tag = "rate_limit_error")]
pub struct RateLimitError {
    pub message: String,
}

/// The request timed out upstream (HTTP 504).
#[record(tag = "timeout_error")]
pub struct GatewayTimeoutError {
    pub message: String,
}

#[record(tag = "api_error")]
pub struct ApiError {
    pub message: String,
}

/// The API is temporarily overloaded (HTTP 529).
#[record(tag = "overloaded_error")]
pub struct OverloadedError {
    pub message: String,
}

/// The `error` member of an error response.
///
/// Decoding is strict: an error type this build does not know is reported
/// rather than guessed at.
#[union(closed)]
pub enum ErrorObject {
    #[variant(tag = "invalid_request_error")]
    InvalidRequest(InvalidRequestError),
    #[variant(tag = "authentication_error")]
    Authentication(AuthenticationError),
    #[variant(tag = "billing_error")]
    Billing(BillingError),
    #[variant(tag = "permission_error")]
    Permission(PermissionError),
    #[variant(tag = "not_found_error")]
    NotFound(NotFoundError),
    #[variant(tag = "request_too_large")]
    RequestTooLarge(RequestTooLargeError),
    #[variant(tag = "rate_limit_error")]
    RateLimit(RateLimitError),
    #[variant(tag = "timeout_error")]
    Timeout(GatewayTimeoutError),
    #[variant(tag = "api_error")]
    Api(ApiError),
    #[variant(tag = "overloaded_error")]
    Overloaded(OverloadedError),
}

impl ErrorObject {
    fn inner(&self) -> &crate::core::record::RawRecord {
        match self {
            Self::InvalidRequest(e) => e.record(),
            Self::Authentication(e) => e.record(),
            Self::Billing(e) => e.record(),
            Self::Permission(e) => e.record(),
            Self::NotFound(e) => e.record(),
            Self::RequestTooLarge(e) => e.record(),
            Self::RateLimit(e) => e.record(),
            Self::Timeout(e) => e.record(),
            Self::Api(e) => e.record(),
            Self::Overloaded(e) => e.record(),
        }
    }

    /// Human-readable message. Every error kind carries one.
    pub fn message(&self) -> Result<String, DataError> {
        self.inner().require("message")
    }

    /// Whether retrying the same request later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimit(_) | Self::Timeout(_) | Self::Api(_) | Self::Overloaded(_)
        )
    }
}

/// Envelope of every non-2xx response body.
#[record(tag = "error")]
pub struct ErrorResponse {
    pub error: ErrorObject,
    pub request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Validate;

    #[test]
    fn decodes_an_overloaded_response() {
        let response = ErrorResponse::from_json(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"},"request_id":"req_1"}"#,
        )
        .unwrap();

        let error = response.error().unwrap();
        assert!(error.is_overloaded());
        assert!(error.is_transient());
        assert_eq!(error.message().unwrap(), "Overloaded");
        assert_eq!(error.discriminator(), Some("overloaded_error"));
        assert_eq!(response.request_id().unwrap().as_deref(), Some("req_1"));
        assert!(response.validate().is_ok());
    }

    #[test]
    fn unknown_error_types_are_rejected() {
        let response = ErrorResponse::from_json(
            r#"{"type":"error","error":{"type":"quota_exhausted_error","message":"later"}}"#,
        )
        .unwrap();

        match response.error() {
            Err(DataError::NoMatchingVariant {
                union,
                discriminator,
                attempts,
            }) => {
                assert_eq!(union, "ErrorObject");
                assert_eq!(discriminator.as_deref(), Some("quota_exhausted_error"));
                assert!(attempts.is_empty());
            }
            other => panic!("expected no matching variant, got {other:?}"),
        }
    }

    #[test]
    fn misshapen_errors_keep_their_attempts_through_the_envelope() {
        let response =
            ErrorResponse::from_json(r#"{"type":"error","error":{"type":"not_found_error"}}"#)
                .unwrap();

        let err = response.error().unwrap_err();
        assert_eq!(err.attempts().len(), 1);
        assert_eq!(err.attempts()[0].variant, "NotFound");
        assert_eq!(err.attempts()[0].cause.field(), Some("message"));
        assert!(matches!(
            response.validate(),
            Err(DataError::NoMatchingVariant { union: "ErrorObject", .. })
        ));
    }

    #[test]
    fn hand_built_errors_report_a_bad_message() {
        let mut error = InvalidRequestError::default();
        error.record_mut().insert_raw("message", serde_json::json!(42));
        let error = ErrorObject::InvalidRequest(error);
        assert!(matches!(
            error.message(),
            Err(DataError::MalformedField { ref key, .. }) if key == "message"
        ));
    }

    #[test]
    fn envelope_tag_is_checked() {
        let response = ErrorResponse::from_json(
            r#"{"type":"message","error":{"type":"api_error","message":"x"}}"#,
        )
        .unwrap();
        assert!(matches!(
            response.check_shape(),
            Err(DataError::TagMismatch { expected: "error", .. })
        ));
    }
}
