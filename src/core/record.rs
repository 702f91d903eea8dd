//! Ordered key/value storage backing every wire type.
//!
//! A [`RawRecord`] keeps each JSON property exactly as it arrived. Typed
//! accessors project values out of it on demand, which is what lets fields a
//! type does not know about survive a decode/encode cycle untouched.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DataError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON object. Anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, DataError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DataError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Serialize `value` and store it under `key`, replacing any previous value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), DataError> {
        let value = serde_json::to_value(value).map_err(|source| DataError::MalformedField {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            source,
        })?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    pub fn insert_raw(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Read a field that must be present and non-null.
    pub fn require<T: FieldValue>(&self, key: &str) -> Result<T, DataError> {
        match self.0.get(key) {
            None => Err(DataError::MissingRequiredField(key.to_string())),
            Some(Value::Null) => Err(DataError::RequiredFieldWasNull(key.to_string())),
            Some(value) => decode_field(key, value),
        }
    }

    /// Read a field that must be present but may be `null`.
    pub fn require_nullable<T: FieldValue>(&self, key: &str) -> Result<Option<T>, DataError> {
        match self.0.get(key) {
            None => Err(DataError::MissingRequiredField(key.to_string())),
            Some(Value::Null) => Ok(None),
            Some(value) => decode_field(key, value).map(Some),
        }
    }

    /// Read a field that may be absent or `null`.
    pub fn optional<T: FieldValue>(&self, key: &str) -> Result<Option<T>, DataError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode_field(key, value).map(Some),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RawRecord> for Value {
    fn from(record: RawRecord) -> Self {
        record.into_value()
    }
}

fn decode_field<T: FieldValue>(key: &str, value: &Value) -> Result<T, DataError> {
    T::from_field(value).map_err(|err| match err {
        DataError::InvalidShape { expected, source } => DataError::MalformedField {
            key: key.to_string(),
            expected,
            source,
        },
        other => other,
    })
}

/// Shape check shared by tagged records.
#[doc(hidden)]
pub fn check_tag(record: &RawRecord, expected: &'static str) -> Result<(), DataError> {
    let found: String = record.require("type")?;
    if found == expected {
        Ok(())
    } else {
        Err(DataError::TagMismatch { expected, found })
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Conversion of one JSON property into a typed field value.
///
/// Leaf values go through serde. Records and unions are implemented by their
/// macros, so a union field that does not fit reports its own
/// `NoMatchingVariant` with every attempt intact.
pub trait FieldValue: Sized {
    fn from_field(value: &Value) -> Result<Self, DataError>;
}

/// Serde-backed [`FieldValue::from_field`].
#[doc(hidden)]
pub fn from_serde<T: DeserializeOwned>(value: &Value) -> Result<T, DataError> {
    T::deserialize(value).map_err(|source| DataError::InvalidShape {
        expected: std::any::type_name::<T>(),
        source,
    })
}

fn wrong_kind<T>(value: &Value, expected: &'static str) -> DataError {
    DataError::InvalidShape {
        expected: std::any::type_name::<T>(),
        source: serde_json::Error::invalid_type(Unexpected::Other(json_kind(value)), &expected),
    }
}

macro_rules! impl_field_value_via_serde {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn from_field(value: &Value) -> Result<Self, DataError> {
                    from_serde(value)
                }
            }
        )*
    };
}

impl_field_value_via_serde!(
    String, bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, Value, RawRecord
);

impl<T: FieldValue> FieldValue for Option<T> {
    fn from_field(value: &Value) -> Result<Self, DataError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_field(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn from_field(value: &Value) -> Result<Self, DataError> {
        match value {
            Value::Array(items) => items.iter().map(T::from_field).collect(),
            other => Err(wrong_kind::<Self>(other, "a JSON array")),
        }
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    fn from_field(value: &Value) -> Result<Self, DataError> {
        T::from_field(value).map(Box::new)
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn from_field(value: &Value) -> Result<Self, DataError> {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| T::from_field(item).map(|decoded| (key.clone(), decoded)))
                .collect(),
            other => Err(wrong_kind::<Self>(other, "a JSON object")),
        }
    }
}

/// A wire type backed by a [`RawRecord`].
///
/// Implemented by `#[record]`; hand implementations should keep the record
/// as the only state so encoding stays verbatim.
pub trait Record: Sized {
    fn from_record(record: RawRecord) -> Self;

    fn record(&self) -> &RawRecord;

    fn record_mut(&mut self) -> &mut RawRecord;

    fn into_record(self) -> RawRecord;

    fn from_value(value: Value) -> Result<Self, DataError> {
        RawRecord::from_value(value).map(Self::from_record)
    }

    fn from_json(json: &str) -> Result<Self, DataError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    fn to_value(&self) -> Value {
        self.record().to_value()
    }

    fn to_json(&self) -> String {
        Value::Object(self.record().as_map().clone()).to_string()
    }
}

/// Field-level checking, run only when a caller asks for it.
///
/// `check_shape` reads the type's own fields so missing, null and malformed
/// values surface, without descending into nested values. The union engines
/// use it to decide whether a candidate fits. `validate` also descends, and
/// is where a permissive union holding an unrecognized variant is rejected.
pub trait Validate {
    fn validate(&self) -> Result<(), DataError>;

    fn check_shape(&self) -> Result<(), DataError> {
        Ok(())
    }
}

macro_rules! impl_validate_noop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Validate for $ty {
                fn validate(&self) -> Result<(), DataError> {
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_noop!(
    String, bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, Value
);

impl Validate for RawRecord {
    fn validate(&self) -> Result<(), DataError> {
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), DataError> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }

    fn check_shape(&self) -> Result<(), DataError> {
        match self {
            Some(inner) => inner.check_shape(),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), DataError> {
        self.iter().try_for_each(Validate::validate)
    }

    fn check_shape(&self) -> Result<(), DataError> {
        self.iter().try_for_each(Validate::check_shape)
    }
}

impl<T: Validate> Validate for Box<T> {
    fn validate(&self) -> Result<(), DataError> {
        (**self).validate()
    }

    fn check_shape(&self) -> Result<(), DataError> {
        (**self).check_shape()
    }
}

impl<T: Validate> Validate for BTreeMap<String, T> {
    fn validate(&self) -> Result<(), DataError> {
        self.values().try_for_each(Validate::validate)
    }

    fn check_shape(&self) -> Result<(), DataError> {
        self.values().try_for_each(Validate::check_shape)
    }
}
