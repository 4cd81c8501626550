#![forbid(unsafe_code)]

//! Layered attribute resolution.
//!
//! Every configuration knob of an input can be supplied in three places,
//! consulted in order:
//!
//! 1. [`Layer::Params`] — per-instance runtime parameters
//! 2. [`Layer::Options`] — general instance options
//! 3. [`Layer::Defaults`] — static component defaults
//!
//! The first layer that yields a defined value wins. A value is either
//! static or computed by a zero-argument provider at lookup time; `null`
//! counts as undefined in both cases, so a provider can defer to the next
//! layer by returning `None` or `null`.
//!
//! # Example
//!
//! ```
//! use formkit_core::attributes::{AttributeLayer, Attributes};
//!
//! let defaults = AttributeLayer::new().with("retrieve_limit", 10);
//! let options = AttributeLayer::new().with("retrieve_limit", 25);
//! let attrs = Attributes::new(defaults).with_options(options);
//!
//! assert_eq!(attrs.get_as::<u32>("retrieve_limit").unwrap(), Some(25));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfigError;

/// Where a resolved attribute came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Per-instance runtime parameters.
    Params,
    /// General instance options.
    Options,
    /// Static component defaults.
    Defaults,
}

/// Zero-argument provider evaluated on every lookup.
pub type Provider = Rc<dyn Fn() -> Option<Value>>;

/// A single attribute entry.
#[derive(Clone)]
pub enum AttributeValue {
    /// Fixed value.
    Static(Value),
    /// Value computed at lookup time.
    Computed(Provider),
}

impl AttributeValue {
    fn resolve(&self) -> Option<Value> {
        let value = match self {
            Self::Static(v) => Some(v.clone()),
            Self::Computed(f) => f(),
        };
        value.filter(|v| !v.is_null())
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One layer of named attributes.
#[derive(Debug, Clone, Default)]
pub struct AttributeLayer {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeLayer {
    /// Create an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Add a computed value.
    #[must_use]
    pub fn with_computed(
        mut self,
        name: impl Into<String>,
        provider: impl Fn() -> Option<Value> + 'static,
    ) -> Self {
        self.entries
            .insert(name.into(), AttributeValue::Computed(Rc::new(provider)));
        self
    }

    /// Overlay `other` on this layer; entries in `other` win.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Set a static value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries
            .insert(name.into(), AttributeValue::Static(value.into()));
    }

    fn resolve(&self, name: &str) -> Option<Value> {
        self.entries.get(name).and_then(AttributeValue::resolve)
    }
}

/// Ordered params → options → defaults resolver.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    params: AttributeLayer,
    options: AttributeLayer,
    defaults: AttributeLayer,
}

impl Attributes {
    /// Create a resolver over component defaults.
    #[must_use]
    pub fn new(defaults: AttributeLayer) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Replace the instance options layer.
    #[must_use]
    pub fn with_options(mut self, options: AttributeLayer) -> Self {
        self.options = options;
        self
    }

    /// Replace the runtime params layer.
    #[must_use]
    pub fn with_params(mut self, params: AttributeLayer) -> Self {
        self.params = params;
        self
    }

    fn layers(&self) -> [(Layer, &AttributeLayer); 3] {
        [
            (Layer::Params, &self.params),
            (Layer::Options, &self.options),
            (Layer::Defaults, &self.defaults),
        ]
    }

    /// Resolve `name` to its first defined value and the layer it came from.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(Layer, Value)> {
        self.layers()
            .into_iter()
            .find_map(|(layer, entries)| entries.resolve(name).map(|v| (layer, v)))
    }

    /// Resolve `name` to its first defined value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|(_, v)| v)
    }

    /// Resolve and deserialize `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAttribute`] if the resolved value does
    /// not deserialize into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        self.get(name)
            .map(|v| serde_json::from_value(v).map_err(|e| ConfigError::invalid(name, e)))
            .transpose()
    }

    /// Resolve and deserialize `name`, falling back to `default`.
    ///
    /// # Errors
    ///
    /// Same as [`Attributes::get_as`].
    pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.get_as(name)?.unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn layered() -> Attributes {
        Attributes::new(AttributeLayer::new().with("limit", 10).with("query", "q"))
            .with_options(AttributeLayer::new().with("limit", 20))
            .with_params(AttributeLayer::new().with("limit", 30))
    }

    #[test]
    fn params_win_over_options_and_defaults() {
        assert_eq!(layered().lookup("limit"), Some((Layer::Params, json!(30))));
    }

    #[test]
    fn falls_through_to_defaults() {
        assert_eq!(layered().lookup("query"), Some((Layer::Defaults, json!("q"))));
        assert_eq!(layered().get("absent"), None);
    }

    #[test]
    fn null_is_undefined() {
        let attrs = Attributes::new(AttributeLayer::new().with("height", "150%"))
            .with_options(AttributeLayer::new().with("height", Value::Null))
            .with_params(AttributeLayer::new().with_computed("height", || None));
        assert_eq!(attrs.get_as::<String>("height").unwrap().as_deref(), Some("150%"));
    }

    #[test]
    fn computed_values_are_evaluated_per_lookup() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let attrs = Attributes::default().with_options(AttributeLayer::new().with_computed(
            "exclude_ids",
            move || {
                counter.set(counter.get() + 1);
                Some(json!([counter.get()]))
            },
        ));
        assert_eq!(attrs.get("exclude_ids"), Some(json!([1])));
        assert_eq!(attrs.get("exclude_ids"), Some(json!([2])));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let attrs = Attributes::default().with_options(AttributeLayer::new().with("limit", "ten"));
        let err = attrs.get_as::<u32>("limit").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAttribute { ref name, .. } if name == "limit"));
        assert_eq!(attrs.get_or("other", 5_u32).unwrap(), 5);
    }

    #[test]
    fn merged_layer_overrides_entries() {
        let base = AttributeLayer::new().with("id_attribute", "id").with("limit", 10);
        let merged = base.merged(AttributeLayer::new().with("id_attribute", "groupId"));
        let attrs = Attributes::new(merged);
        assert_eq!(attrs.get("id_attribute"), Some(json!("groupId")));
        assert_eq!(attrs.get("limit"), Some(json!(10)));
    }
}
