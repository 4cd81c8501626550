#![forbid(unsafe_code)]

//! Entity id values.
//!
//! Ids come straight from server records, so they are whatever JSON value
//! the id field carries. A record without the id field still has an id:
//! [`EntityId::Missing`], which compares equal to itself so registry lookups
//! and set comparisons keep working on malformed input.

use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

/// The value of an entity's id field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntityId {
    /// The record had no id field.
    #[default]
    Missing,
    /// Any JSON value found in the id field.
    Value(Value),
}

impl EntityId {
    /// Build an id from an optional field lookup.
    #[must_use]
    pub fn from_field(value: Option<&Value>) -> Self {
        value.map_or(Self::Missing, |v| Self::Value(v.clone()))
    }

    /// Whether the record carried no id at all.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Strings print bare, other values print as JSON, `Missing` prints empty.
impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Value(Value::String(s)) => f.write_str(s),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_owned()))
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<Value> for EntityId {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_unit(),
            Self::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_equals_missing() {
        assert_eq!(EntityId::Missing, EntityId::from_field(None));
        assert!(EntityId::default().is_missing());
    }

    #[test]
    fn string_and_number_ids_are_distinct() {
        assert_ne!(EntityId::from("1"), EntityId::from(1_i64));
    }

    #[test]
    fn display_matches_filter_text() {
        assert_eq!(EntityId::from("00u1").to_string(), "00u1");
        assert_eq!(EntityId::from(42_u64).to_string(), "42");
        assert_eq!(EntityId::Missing.to_string(), "");
    }

    #[test]
    fn deserializes_any_json_value() {
        let ids: Vec<EntityId> = serde_json::from_value(json!(["a", 2, null])).unwrap();
        assert_eq!(
            ids,
            vec![
                EntityId::from("a"),
                EntityId::from(2_i64),
                EntityId::Value(Value::Null)
            ]
        );
        assert_eq!(serde_json::to_value(EntityId::Missing).unwrap(), Value::Null);
    }
}
