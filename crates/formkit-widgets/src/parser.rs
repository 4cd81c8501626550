#![forbid(unsafe_code)]

//! Server record normalization.
//!
//! A picker-specific parse function turns each raw record into an
//! [`Entity`]. Escaping is composed around it once, at construction, so a
//! custom parse never has to remember to escape.

use std::rc::Rc;

use formkit_core::EntityId;
use formkit_core::entity::Entity;
use formkit_core::escape::escape_entity;
use serde_json::Value;

/// Record-to-entity transformation.
pub type ParseFn = Rc<dyn Fn(Entity) -> Entity>;

/// Parses raw records, applying the exclusion filter and escaping.
#[derive(Clone)]
pub struct EntityParser {
    id_field: String,
    parse: ParseFn,
}

impl EntityParser {
    /// Compose `parse` (identity when `None`) with escaping when `escape` is set.
    #[must_use]
    pub fn new(id_field: impl Into<String>, parse: Option<ParseFn>, escape: bool) -> Self {
        let parse: ParseFn = match (parse, escape) {
            (Some(user), true) => Rc::new(move |entity| escape_entity(user(entity))),
            (Some(user), false) => user,
            (None, true) => Rc::new(escape_entity),
            (None, false) => Rc::new(|entity| entity),
        };
        Self {
            id_field: id_field.into(),
            parse,
        }
    }

    /// Parse one raw record.
    #[must_use]
    pub fn parse(&self, raw: Value) -> Entity {
        (self.parse)(Entity::from_value(raw))
    }

    /// Drop excluded records, then parse the rest in order.
    ///
    /// Exclusion only applies when `exclude` is a non-empty list; records are
    /// matched on their raw id before parsing.
    #[must_use]
    pub fn parse_all(&self, raw: Vec<Value>, exclude: Option<&[EntityId]>) -> Vec<Entity> {
        let exclude = exclude.filter(|ids| !ids.is_empty());
        raw.into_iter()
            .map(Entity::from_value)
            .filter(|entity| exclude.is_none_or(|ids| !ids.contains(&entity.id(&self.id_field))))
            .map(|entity| (self.parse)(entity))
            .collect()
    }
}

impl std::fmt::Debug for EntityParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityParser")
            .field("id_field", &self.id_field)
            .finish_non_exhaustive()
    }
}
