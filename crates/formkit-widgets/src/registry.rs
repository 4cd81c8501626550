#![forbid(unsafe_code)]

//! The picker's source of truth for what is selected.
//!
//! Two parallel sequences in selection order:
//!
//! - `entities` — parsed entities, unique by id
//! - `model_value` — the ids written to the host model
//!
//! Every entity's id is in `model_value`, and no two entities share an id.
//! The reverse only fails for ids carried over from the host model that no
//! prefetched record resolved; those stay until the user removes them or
//! implicit sync drops them. [`SelectionRegistry::replace_entities`] is the
//! one exception: read mode shows whatever the server returned.
//!
//! Lookups use exact id equality. Removal never reorders what remains, and
//! an id removed then added again goes to the end.

use formkit_core::{Entity, EntityId};

/// Selected entities and the model value derived from them.
#[derive(Debug, Clone, Default)]
pub struct SelectionRegistry {
    id_field: String,
    entities: Vec<Entity>,
    model_value: Vec<EntityId>,
}

impl SelectionRegistry {
    /// Create an empty registry keyed on `id_field`.
    #[must_use]
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            ..Self::default()
        }
    }

    /// Start over from the host's stored ids, with nothing resolved yet.
    pub fn reset(&mut self, model_value: Vec<EntityId>) {
        self.entities.clear();
        self.model_value = model_value;
    }

    /// Select `entity`. Returns `true` if the model value changed.
    ///
    /// Selecting an id that is already selected is a no-op, except that an
    /// unresolved carried-over id gets its entity attached.
    pub fn add(&mut self, entity: Entity) -> bool {
        let id = entity.id(&self.id_field);
        if self.contains(&id) {
            if !self.has_entity(&id) {
                self.entities.push(entity);
            }
            return false;
        }
        if self.has_entity(&id) {
            formkit_core::debug!(id = %id, "entity already resolved, add ignored");
            return false;
        }
        formkit_core::debug!(id = %id, "selection added");
        self.model_value.push(id);
        self.entities.push(entity);
        true
    }

    /// Deselect `id`. Returns `true` if the model value changed.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        formkit_core::debug!(id = %id, "selection removed");
        self.model_value.retain(|v| v != id);
        let field = &self.id_field;
        self.entities.retain(|e| e.id(field) != *id);
        true
    }

    /// Record a prefetched entity for an id already in the model value.
    ///
    /// Duplicates and ids outside the model value are ignored. Returns
    /// `true` if the entity was stored.
    pub fn seed(&mut self, entity: Entity) -> bool {
        let id = entity.id(&self.id_field);
        if self.has_entity(&id) {
            return false;
        }
        if !self.contains(&id) {
            formkit_core::debug!(id = %id, "prefetched record not in model value, skipped");
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Replace the resolved entities without touching the model value.
    pub fn replace_entities(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
    }

    /// Make the model value exactly the ids of the resolved entities.
    ///
    /// Returns `true` if the model value changed.
    pub fn sync_model_to_entities(&mut self) -> bool {
        let synced: Vec<EntityId> = self.entities.iter().map(|e| e.id(&self.id_field)).collect();
        if synced == self.model_value {
            return false;
        }
        self.model_value = synced;
        true
    }

    /// The live, ordered model value.
    #[must_use]
    pub fn current_model_value(&self) -> &[EntityId] {
        &self.model_value
    }

    /// Resolved entities in selection order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Ids in the model value with no resolved entity.
    #[must_use]
    pub fn unresolved(&self) -> Vec<&EntityId> {
        self.model_value
            .iter()
            .filter(|id| !self.has_entity(id))
            .collect()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.model_value.contains(id)
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.model_value.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.model_value.is_empty()
    }

    /// Display names of the resolved entities, skipping nameless ones.
    #[must_use]
    pub fn display_names(&self, name_field: &str) -> Vec<&str> {
        self.entities
            .iter()
            .filter_map(|e| e.display_name(name_field))
            .collect()
    }

    fn has_entity(&self, id: &EntityId) -> bool {
        self.entities.iter().any(|e| e.id(&self.id_field) == *id)
    }
}
