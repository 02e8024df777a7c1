//! Structured payload values and canonicalization.
//!
//! Payloads are a closed set of kinds: null, booleans, numbers, strings,
//! sequences, and mappings. Mappings remember insertion order so that
//! canonicalization is an observable, testable step rather than an accident
//! of the container type.
//!
//! Canonicalization sorts mapping keys lexicographically at every depth.
//! Two payloads that are deep-equal as unordered structures canonicalize to
//! the same value and therefore to identical bytes (and identical
//! addresses) everywhere.

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Numbers reuse serde_json's representation: i64, u64, or finite f64.
/// Non-finite floats are unrepresentable.
pub use serde_json::Number;

/// A structured payload value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    /// Key-value pairs in insertion order. Canonicalization sorts them.
    Mapping(Vec<(String, Value)>),
}

impl Value {
    /// Build a number value from a float.
    ///
    /// Fails for NaN and infinities, which have no canonical text form.
    pub fn number_from_f64(f: f64) -> Result<Self, CoreError> {
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| CoreError::UnsupportedValue(format!("non-finite number: {f}")))
    }

    /// Recursively sort mapping keys, producing the canonical form.
    ///
    /// Scalars and sequence order pass through unchanged. A mapping with a
    /// duplicate key is rejected rather than silently deduplicated.
    /// Canonicalizing an already-canonical value is the identity.
    pub fn canonicalize(self) -> Result<CanonicalValue, CoreError> {
        Ok(CanonicalValue(canonicalize_value(self)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a mapping key. Returns the first match.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

fn canonicalize_value(value: Value) -> Result<Value, CoreError> {
    match value {
        Value::Sequence(items) => {
            let items = items
                .into_iter()
                .map(canonicalize_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Sequence(items))
        }
        Value::Mapping(entries) => {
            let mut entries = entries
                .into_iter()
                .map(|(k, v)| Ok((k, canonicalize_value(v)?)))
                .collect::<Result<Vec<_>, CoreError>>()?;
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for pair in entries.windows(2) {
                if pair[0].0 == pair[1].0 {
                    return Err(CoreError::DuplicateKey(pair[0].0.clone()));
                }
            }
            Ok(Value::Mapping(entries))
        }
        scalar => Ok(scalar),
    }
}

/// Check that every mapping is sorted and duplicate-free.
fn check_canonical(value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Sequence(items) => items.iter().try_for_each(check_canonical),
        Value::Mapping(entries) => {
            for pair in entries.windows(2) {
                match pair[0].0.cmp(&pair[1].0) {
                    std::cmp::Ordering::Less => {}
                    std::cmp::Ordering::Equal => {
                        return Err(CoreError::DuplicateKey(pair[0].0.clone()));
                    }
                    std::cmp::Ordering::Greater => {
                        return Err(CoreError::MalformedExpression(format!(
                            "mapping keys out of canonical order: {:?} after {:?}",
                            pair[1].0, pair[0].0
                        )));
                    }
                }
            }
            entries.iter().try_for_each(|(_, v)| check_canonical(v))
        }
        _ => Ok(()),
    }
}

/// A payload whose mappings are sorted and duplicate-free at every depth.
///
/// Only produced by [`Value::canonicalize`] or by validating existing data
/// with [`CanonicalValue::from_canonical`], so envelopes can carry it as a
/// witness that the signing and addressing input is stable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalValue(Value);

impl CanonicalValue {
    /// Accept a value that is already canonical. Rejects unsorted or
    /// duplicated mapping keys instead of fixing them up.
    pub fn from_canonical(value: Value) -> Result<Self, CoreError> {
        check_canonical(&value)?;
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a top-level mapping key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

// ── Conversions ────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ── Serde ──────────────────────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a structured payload value")
            }

            fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
                Ok(Value::Bool(b))
            }

            fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
                Ok(Value::Number(n.into()))
            }

            fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
                Ok(Value::Number(n.into()))
            }

            fn visit_f64<E: serde::de::Error>(self, n: f64) -> Result<Value, E> {
                Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| E::custom(format!("non-finite number: {n}")))
            }

            fn visit_str<E>(self, s: &str) -> Result<Value, E> {
                Ok(Value::String(s.to_owned()))
            }

            fn visit_string<E>(self, s: String) -> Result<Value, E> {
                Ok(Value::String(s))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
                Value::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Sequence(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
                // Document order is preserved; canonicalization is explicit.
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(Value::Mapping(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        CanonicalValue::from_canonical(value).map_err(serde::de::Error::custom)
    }
}
