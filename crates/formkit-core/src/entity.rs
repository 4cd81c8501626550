#![forbid(unsafe_code)]

//! Parsed entity records.
//!
//! An [`Entity`] is the normalized shape of one selectable item (a user, a
//! group, ...): a JSON object whose id and display-name fields are named by
//! the picker configuration rather than fixed here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::EntityId;

/// One selectable item, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: Map<String, Value>,
}

impl Entity {
    /// Create an entity with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built field map.
    #[must_use]
    pub const fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build an entity from a raw server record.
    ///
    /// Objects map field-for-field. Any other JSON value yields an entity
    /// with no fields, whose id is therefore [`EntityId::Missing`].
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        match raw {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Set a field, returning the entity for chaining.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The value of the id field, or [`EntityId::Missing`].
    #[must_use]
    pub fn id(&self, id_field: &str) -> EntityId {
        EntityId::from_field(self.fields.get(id_field))
    }

    /// The display name, when the name field holds a string.
    #[must_use]
    pub fn display_name(&self, name_field: &str) -> Option<&str> {
        self.fields.get(name_field).and_then(Value::as_str)
    }

    /// Borrow all fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume into the field map.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Consume into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
