#![forbid(unsafe_code)]

//! Host model contract.
//!
//! Inputs never own the form data. They read and write a list-valued field
//! on the host's model and raise named events on it; the host decides what
//! re-renders.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::entity::Entity;
use crate::id::EntityId;

/// Notifications an input raises on its host model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// `change:<field>` — the field's selection membership changed.
    Change(String),
    /// `form:resize` — the input's rendered size may have changed.
    Resize,
    /// `select:<field>` — an entity was picked in autosuggest mode.
    Select {
        /// Field name.
        field: String,
        /// The picked entity.
        entity: Entity,
    },
}

impl ModelEvent {
    /// The wire name of the event, e.g. `change:groups`.
    #[must_use]
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Change(field) => write!(f, "change:{field}"),
            Self::Resize => f.write_str("form:resize"),
            Self::Select { field, .. } => write!(f, "select:{field}"),
        }
    }
}

/// The form model an input is bound to.
pub trait HostModel {
    /// Current value of a list field, `None` when unset.
    fn model_value(&self, field: &str) -> Option<Vec<EntityId>>;

    /// Overwrite a list field. Must not raise events on its own.
    fn set_model_value(&mut self, field: &str, value: Vec<EntityId>);

    /// Raise a notification.
    fn trigger(&mut self, event: ModelEvent);
}

/// A model shared by several inputs of the same form.
impl<M: HostModel + ?Sized> HostModel for Rc<RefCell<M>> {
    fn model_value(&self, field: &str) -> Option<Vec<EntityId>> {
        self.borrow().model_value(field)
    }

    fn set_model_value(&mut self, field: &str, value: Vec<EntityId>) {
        self.borrow_mut().set_model_value(field, value);
    }

    fn trigger(&mut self, event: ModelEvent) {
        self.borrow_mut().trigger(event);
    }
}

/// In-memory host model that records every event it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
    values: BTreeMap<String, Vec<EntityId>>,
    events: Vec<ModelEvent>,
}

impl MemoryModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset a field value.
    #[must_use]
    pub fn with_value<I>(mut self, field: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<EntityId>,
    {
        self.values
            .insert(field.into(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Events raised so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[ModelEvent] {
        &self.events
    }

    /// Number of events with the given wire name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }
}

impl HostModel for MemoryModel {
    fn model_value(&self, field: &str) -> Option<Vec<EntityId>> {
        self.values.get(field).cloned()
    }

    fn set_model_value(&mut self, field: &str, value: Vec<EntityId>) {
        self.values.insert(field.to_owned(), value);
    }

    fn trigger(&mut self, event: ModelEvent) {
        self.events.push(event);
    }
}
