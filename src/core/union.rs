//! Tagged-union decoding.
//!
//! Two engines live here:
//!
//! - Discriminated unions read one string field (normally `type`) and
//!   dispatch to exactly one candidate shape. They come in two policies with
//!   separate entry points: [`decode_closed`] fails with a structured error
//!   when nothing fits, [`decode_open`] keeps the raw JSON in an unknown
//!   variant instead.
//! - Ordered unions have no usable discriminator. [`OrderedTrial`] tries each
//!   candidate in declaration order and keeps the first that fits.
//!
//! Neither engine adds structure on the way out: a union serializes as
//! whatever it wraps.

use serde_json::Value;
use tracing::debug;

use super::error::{DataError, VariantAttempt};
use super::record::{FieldValue, Validate, json_kind};

/// A union whose members are told apart by a string discriminator.
pub trait DiscriminatedUnion: Sized {
    const NAME: &'static str;

    const DISCRIMINATOR: &'static str = "type";

    /// Every discriminator value this build knows, in declaration order.
    const TAGS: &'static [&'static str];

    /// Decode `value` as the single member registered for `tag`.
    ///
    /// Returns the member's name alongside the outcome, or `None` when no
    /// member is registered for `tag`.
    fn dispatch(tag: &str, value: &Value) -> Option<(&'static str, Result<Self, DataError>)>;
}

/// A discriminated union that can hold members it does not recognise.
pub trait OpenUnion: DiscriminatedUnion {
    fn unknown(value: Value) -> Self;
}

/// Read the discriminator of `value`, if it has a string one.
pub fn discriminator<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

/// Strict policy: every failure is an error.
pub fn decode_closed<U: DiscriminatedUnion>(value: Value) -> Result<U, DataError> {
    let Some(tag) = discriminator(&value, U::DISCRIMINATOR) else {
        return Err(DataError::NoMatchingVariant {
            union: U::NAME,
            discriminator: None,
            attempts: Vec::new(),
        });
    };

    match U::dispatch(tag, &value) {
        Some((_, Ok(decoded))) => Ok(decoded),
        Some((variant, Err(cause))) => Err(DataError::NoMatchingVariant {
            union: U::NAME,
            discriminator: Some(tag.to_string()),
            attempts: vec![VariantAttempt::new(variant, cause)],
        }),
        None => Err(DataError::NoMatchingVariant {
            union: U::NAME,
            discriminator: Some(tag.to_string()),
            attempts: Vec::new(),
        }),
    }
}

/// Permissive policy: anything that does not fit becomes `U::unknown`.
pub fn decode_open<U: OpenUnion>(value: Value) -> U {
    let outcome = match discriminator(&value, U::DISCRIMINATOR) {
        Some(tag) => U::dispatch(tag, &value),
        None => None,
    };

    match outcome {
        Some((_, Ok(decoded))) => decoded,
        Some((variant, Err(cause))) => {
            debug!(
                union = U::NAME,
                variant,
                error = %cause,
                "variant did not fit, keeping raw value"
            );
            U::unknown(value)
        }
        None => {
            debug!(
                union = U::NAME,
                discriminator = discriminator(&value, U::DISCRIMINATOR),
                "unrecognized variant, keeping raw value"
            );
            U::unknown(value)
        }
    }
}

/// Decode `value` as `T` and run its shallow field check.
///
/// This is how both engines decide whether a candidate fits.
pub fn try_shape<T: FieldValue + Validate>(value: &Value) -> Result<T, DataError> {
    let decoded = T::from_field(value)?;
    decoded.check_shape()?;
    Ok(decoded)
}

/// Validation of an unknown member of a permissive union.
pub fn reject_unknown(union: &'static str, field: &str, value: &Value) -> DataError {
    DataError::UnknownVariantRejected {
        union,
        discriminator: discriminator(value, field).map(str::to_string),
    }
}

/// Ordered trial over candidate shapes.
///
/// ```
/// use anthropic_types::core::union::OrderedTrial;
/// use serde_json::json;
///
/// #[derive(Debug, PartialEq)]
/// enum Prompt {
///     Text(String),
///     Lines(Vec<String>),
/// }
///
/// let value = json!(["a", "b"]);
/// let prompt = OrderedTrial::new("Prompt", &value)
///     .candidate("Text", Prompt::Text)
///     .candidate("Lines", Prompt::Lines)
///     .finish()
///     .unwrap();
/// assert_eq!(prompt, Prompt::Lines(vec!["a".into(), "b".into()]));
/// ```
pub struct OrderedTrial<'a, U> {
    union: &'static str,
    value: &'a Value,
    found: Option<U>,
    attempts: Vec<VariantAttempt>,
}

impl<'a, U> OrderedTrial<'a, U> {
    pub fn new(union: &'static str, value: &'a Value) -> Self {
        Self {
            union,
            value,
            found: None,
            attempts: Vec::new(),
        }
    }

    /// Try the next candidate. Skipped once an earlier candidate has matched.
    pub fn candidate<T, F>(mut self, variant: &'static str, wrap: F) -> Self
    where
        T: FieldValue + Validate,
        F: FnOnce(T) -> U,
    {
        if self.found.is_some() {
            return self;
        }
        match try_shape::<T>(self.value) {
            Ok(decoded) => self.found = Some(wrap(decoded)),
            Err(cause) => self.attempts.push(VariantAttempt::new(variant, cause)),
        }
        self
    }

    pub fn finish(self) -> Result<U, DataError> {
        self.found.ok_or_else(|| {
            debug!(
                union = self.union,
                found = json_kind(self.value),
                attempts = self.attempts.len(),
                "no ordered candidate matched"
            );
            DataError::NoMatchingVariant {
                union: self.union,
                discriminator: None,
                attempts: self.attempts,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ContentBlock, ErrorObject, TextBlock};
    use serde_json::json;

    #[test]
    fn closed_dispatch_rejects_unknown_tags() {
        let err = decode_closed::<ErrorObject>(json!({ "type": "brand_new_error", "message": "x" }))
            .unwrap_err();
        match err {
            DataError::NoMatchingVariant {
                union,
                discriminator,
                attempts,
            } => {
                assert_eq!(union, "ErrorObject");
                assert_eq!(discriminator.as_deref(), Some("brand_new_error"));
                assert!(attempts.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn closed_dispatch_names_the_shape_that_failed() {
        let err = decode_closed::<ErrorObject>(json!({ "type": "rate_limit_error" })).unwrap_err();
        let attempts = err.attempts();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].variant, "RateLimit");
        assert!(matches!(
            *attempts[0].cause,
            DataError::MissingRequiredField(ref key) if key == "message"
        ));
    }

    #[test]
    fn closed_dispatch_without_discriminator() {
        let err = decode_closed::<ErrorObject>(json!({ "message": "x" })).unwrap_err();
        assert!(matches!(
            err,
            DataError::NoMatchingVariant { discriminator: None, .. }
        ));
    }

    #[test]
    fn open_dispatch_keeps_unfit_members() {
        let raw = json!({ "type": "text", "text": 7 });
        let block = decode_open::<ContentBlock>(raw.clone());
        assert_eq!(block, ContentBlock::Unknown(raw));
    }

    #[test]
    fn open_dispatch_without_discriminator() {
        let raw = json!("just a string");
        assert_eq!(
            decode_open::<ContentBlock>(raw.clone()),
            ContentBlock::Unknown(raw)
        );
    }

    #[test]
    fn ordered_trial_stops_at_first_match() {
        let value = json!({ "type": "text", "text": "hi" });
        let picked = OrderedTrial::new("Pick", &value)
            .candidate("Record", |b: TextBlock| b.text().unwrap())
            .candidate("Raw", |v: Value| v.to_string())
            .finish()
            .unwrap();
        assert_eq!(picked, "hi");
    }

    #[test]
    fn ordered_trial_aggregates_every_failure() {
        let value = json!(12);
        let err = OrderedTrial::<()>::new("Pick", &value)
            .candidate("Text", |_: String| ())
            .candidate("Block", |_: TextBlock| ())
            .finish()
            .unwrap_err();

        let names: Vec<_> = err.attempts().iter().map(|a| a.variant).collect();
        assert_eq!(names, vec!["Text", "Block"]);
    }
}
