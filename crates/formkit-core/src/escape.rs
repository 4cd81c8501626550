#![forbid(unsafe_code)]

//! Tag escaping for parsed entities.
//!
//! Entity fields end up in markup outside of attribute values, so only the
//! tag delimiters are replaced. `&` and quotes are left alone: selected names
//! are later compared against unescaped query results and must still match.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::entity::Entity;

/// Replace `<` and `>` with their HTML entities.
#[must_use]
pub fn escape_tags(value: &str) -> Cow<'_, str> {
    if !value.contains(['<', '>']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape every string inside `value`, recursing through objects and arrays.
#[must_use]
pub fn escape_value(value: Value) -> Value {
    match value {
        Value::String(s) => match escape_tags(&s) {
            Cow::Borrowed(_) => Value::String(s),
            Cow::Owned(escaped) => Value::String(escaped),
        },
        Value::Object(map) => Value::Object(escape_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(escape_value).collect()),
        other => other,
    }
}

fn escape_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (escape_tags(&key).into_owned(), escape_value(value)))
        .collect()
}

/// Escape all keys and string values of an entity.
#[must_use]
pub fn escape_entity(entity: Entity) -> Entity {
    Entity::from_fields(escape_map(entity.into_fields()))
}
