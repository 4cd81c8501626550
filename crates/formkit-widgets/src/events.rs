#![forbid(unsafe_code)]

//! Input event bindings.
//!
//! Each picker instance owns an immutable binding table built by merging
//! instance overrides over the shared defaults. The defaults themselves are
//! never mutated.

use std::collections::BTreeMap;

/// What the input does with a DOM event it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// Let the event bubble to the host form.
    Propagate,
    /// Keep the event inside the input.
    StopPropagation,
}

/// Per-instance event binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvents {
    bindings: BTreeMap<String, EventAction>,
}

impl Default for InputEvents {
    fn default() -> Self {
        Self::defaults()
    }
}

impl InputEvents {
    /// Shared defaults: key-up events stay inside the picker so the host
    /// form does not treat typing in the search box as form input.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            bindings: BTreeMap::from([("keyup".to_owned(), EventAction::StopPropagation)]),
        }
    }

    /// Defaults with `overrides` taking precedence.
    #[must_use]
    pub fn merged<I, S>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, EventAction)>,
        S: Into<String>,
    {
        let mut events = Self::defaults();
        events
            .bindings
            .extend(overrides.into_iter().map(|(name, action)| (name.into(), action)));
        events
    }

    /// Action for `event`; unbound events propagate.
    #[must_use]
    pub fn action(&self, event: &str) -> EventAction {
        self.bindings
            .get(event)
            .copied()
            .unwrap_or(EventAction::Propagate)
    }

    /// All bindings, sorted by event name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, EventAction)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
