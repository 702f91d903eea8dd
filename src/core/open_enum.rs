//! String enumerations that tolerate values added after the client was built.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use super::error::DataError;
use super::record::{FieldValue, Validate, from_serde};

/// A closed set of known wire strings, usually derived with `#[api_enum]`.
pub trait KnownValue: Copy + PartialEq + 'static {
    /// Name used in error messages.
    const NAME: &'static str;

    /// Two-way table between wire strings and values.
    const VALUES: &'static [(&'static str, Self)];

    fn as_str(&self) -> &'static str {
        Self::VALUES
            .iter()
            .find(|(_, value)| value == self)
            .map(|(wire, _)| *wire)
            .unwrap_or_default()
    }

    fn from_wire(wire: &str) -> Option<Self> {
        Self::VALUES
            .iter()
            .find(|(candidate, _)| *candidate == wire)
            .map(|(_, value)| *value)
    }
}

/// A wire string paired with its best-effort mapping into `E`.
///
/// Encoding always emits the stored wire string, so a value this build does
/// not recognise is written back exactly as it was read.
#[derive(Clone)]
pub struct OpenEnum<E> {
    wire: String,
    known: Option<E>,
}

impl<E: KnownValue> OpenEnum<E> {
    pub fn from_wire(wire: impl Into<String>) -> Self {
        let wire = wire.into();
        let known = E::from_wire(&wire);
        if known.is_none() {
            trace!(enum_name = E::NAME, value = %wire, "unrecognized enum value");
        }
        Self { wire, known }
    }

    /// The mapped value, or `None` when the wire string is not in `E`.
    pub fn known(&self) -> Option<E> {
        self.known
    }

    pub fn is_known(&self) -> bool {
        self.known.is_some()
    }

    /// The mapped value, failing for callers that cannot handle new values.
    pub fn require_known(&self) -> Result<E, DataError> {
        self.known.ok_or_else(|| DataError::UnknownVariantRejected {
            union: E::NAME,
            discriminator: Some(self.wire.clone()),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.wire
    }

    pub fn into_wire(self) -> String {
        self.wire
    }
}

impl<E: KnownValue> From<E> for OpenEnum<E> {
    fn from(value: E) -> Self {
        Self {
            wire: value.as_str().to_string(),
            known: Some(value),
        }
    }
}

impl<E: KnownValue> PartialEq<E> for OpenEnum<E> {
    fn eq(&self, other: &E) -> bool {
        self.known == Some(*other)
    }
}

// Equality and hashing go through the wire string: two values are the same
// exactly when they encode the same.
impl<E> PartialEq for OpenEnum<E> {
    fn eq(&self, other: &Self) -> bool {
        self.wire == other.wire
    }
}

impl<E> Eq for OpenEnum<E> {}

impl<E> Hash for OpenEnum<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wire.hash(state);
    }
}

impl<E: fmt::Debug> fmt::Debug for OpenEnum<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.known {
            Some(value) => write!(f, "{value:?}"),
            None => write!(f, "Unrecognized({:?})", self.wire),
        }
    }
}

impl<E> fmt::Display for OpenEnum<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire)
    }
}

impl<E> Serialize for OpenEnum<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.wire)
    }
}

impl<'de, E: KnownValue> Deserialize<'de> for OpenEnum<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = String::deserialize(deserializer)?;
        Ok(Self::from_wire(wire))
    }
}

impl<E: KnownValue> FieldValue for OpenEnum<E> {
    fn from_field(value: &serde_json::Value) -> Result<Self, DataError> {
        from_serde(value)
    }
}

impl<E> Validate for OpenEnum<E> {
    fn validate(&self) -> Result<(), DataError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::StopReason;

    #[test]
    fn unknown_values_keep_their_wire_string() {
        let reason: OpenEnum<StopReason> =
            serde_json::from_str(r#""some_new_value_v3""#).unwrap();

        assert_eq!(reason.known(), None);
        assert_eq!(reason.as_str(), "some_new_value_v3");
        assert_eq!(
            serde_json::to_string(&reason).unwrap(),
            r#""some_new_value_v3""#
        );
        assert!(reason.validate().is_ok());
        assert!(matches!(
            reason.require_known(),
            Err(DataError::UnknownVariantRejected { .. })
        ));
    }

    #[test]
    fn known_values_map_both_ways() {
        let reason: OpenEnum<StopReason> = serde_json::from_str(r#""tool_use""#).unwrap();
        assert_eq!(reason.known(), Some(StopReason::ToolUse));
        assert_eq!(reason, StopReason::ToolUse);

        let built = OpenEnum::from(StopReason::PauseTurn);
        assert_eq!(built.as_str(), "pause_turn");
        assert_eq!(serde_json::to_string(&built).unwrap(), r#""pause_turn""#);
    }

    #[test]
    fn non_string_wire_values_are_a_shape_error() {
        assert!(serde_json::from_str::<OpenEnum<StopReason>>("42").is_err());
    }

    #[test]
    fn debug_marks_unrecognized_values() {
        let reason = OpenEnum::<StopReason>::from_wire("later");
        assert_eq!(format!("{reason:?}"), r#"Unrecognized("later")"#);
    }
}
