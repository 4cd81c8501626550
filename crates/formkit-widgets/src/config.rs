#![forbid(unsafe_code)]

//! Picker configuration.
//!
//! Knobs are looked up through [`Attributes`] so each one can come from
//! runtime params, instance options, or component defaults. Everything but
//! the exclusion list is frozen into a [`PickerConfig`] when the picker is
//! built; the exclusion list is looked up on every parse so a computed
//! provider can follow the rest of the form.

use std::collections::BTreeMap;

use formkit_core::{AttributeLayer, Attributes, ConfigError, EntityId};
use serde_json::Value;

/// Attribute names understood by the picker.
pub mod attr {
    pub const API_URL: &str = "api_url";
    pub const ID_ATTRIBUTE: &str = "id_attribute";
    pub const NAME_ATTRIBUTE: &str = "name_attribute";
    pub const EXTRA_PARAMS: &str = "extra_params";
    pub const RETRIEVE_LIMIT: &str = "retrieve_limit";
    pub const SELECTION_LIMIT: &str = "selection_limit";
    pub const QUERY_PARAM: &str = "query_param";
    pub const ESCAPE_ENTITIES: &str = "escape_entities";
    pub const BATCH_SIZE: &str = "batch_size";
    pub const IMPLICIT_SYNC: &str = "implicit_sync";
    pub const EXCLUDE_IDS: &str = "exclude_ids";
    pub const HEIGHT: &str = "height";
    pub const AUTO_SUGGEST_MODE: &str = "auto_suggest_mode";
    pub const ARBITRARY: &str = "arbitrary";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const DEFAULT_VALUE: &str = "default_value";
}

/// Component defaults shared by every picker.
#[must_use]
pub fn picker_defaults() -> AttributeLayer {
    AttributeLayer::new()
        .with(attr::ID_ATTRIBUTE, "id")
        .with(attr::NAME_ATTRIBUTE, "name")
        .with(attr::EXTRA_PARAMS, Value::Object(serde_json::Map::new()))
        .with(attr::RETRIEVE_LIMIT, 10)
        .with(attr::SELECTION_LIMIT, false)
        .with(attr::QUERY_PARAM, "q")
        .with(attr::ESCAPE_ENTITIES, true)
        .with(attr::BATCH_SIZE, 0)
        .with(attr::IMPLICIT_SYNC, false)
        .with(attr::HEIGHT, "150%")
        .with(attr::AUTO_SUGGEST_MODE, false)
        .with(attr::ARBITRARY, false)
        .with(attr::DEFAULT_VALUE, " - ")
}

/// Resolved, immutable picker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerConfig {
    /// Collection endpoint for search and prefetch.
    pub endpoint: String,
    /// Field holding the entity id.
    pub id_field: String,
    /// Field holding the display name.
    pub name_field: String,
    /// Static query parameters sent with every request.
    pub extra_params: BTreeMap<String, String>,
    /// Search result cap.
    pub retrieve_limit: u32,
    /// Maximum number of selections, `None` for unlimited.
    pub selection_limit: Option<u32>,
    /// Name of the search query parameter.
    pub query_param: String,
    /// Tag-escape parsed entities.
    pub escape_entities: bool,
    /// Ids per prefetch request, `0` for unbatched.
    pub batch_size: usize,
    /// Repair model values that reference unresolvable ids.
    pub implicit_sync: bool,
    /// CSS height for the input, if any.
    pub height: Option<String>,
    /// Publish picks instead of selecting them.
    pub auto_suggest_mode: bool,
    /// Allow free-text entries in the widget.
    pub arbitrary: bool,
    /// Placeholder text for the search box.
    pub placeholder: Option<String>,
    /// Read-mode text when nothing is selected.
    pub default_value: String,
}

impl PickerConfig {
    /// Resolve every frozen knob.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingEndpoint`] when no non-empty `api_url` resolves;
    /// [`ConfigError::InvalidAttribute`] when a knob has the wrong shape.
    pub fn resolve(attrs: &Attributes) -> Result<Self, ConfigError> {
        let endpoint = attrs
            .get_as::<String>(attr::API_URL)?
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        Ok(Self {
            endpoint,
            id_field: attrs.get_or(attr::ID_ATTRIBUTE, "id".to_owned())?,
            name_field: attrs.get_or(attr::NAME_ATTRIBUTE, "name".to_owned())?,
            extra_params: extra_params(attrs)?,
            retrieve_limit: attrs.get_or(attr::RETRIEVE_LIMIT, 10)?,
            selection_limit: selection_limit(attrs)?,
            query_param: attrs.get_or(attr::QUERY_PARAM, "q".to_owned())?,
            escape_entities: attrs.get_or(attr::ESCAPE_ENTITIES, true)?,
            batch_size: attrs.get_or(attr::BATCH_SIZE, 0)?,
            implicit_sync: attrs.get_or(attr::IMPLICIT_SYNC, false)?,
            height: attrs.get_as(attr::HEIGHT)?,
            auto_suggest_mode: attrs.get_or(attr::AUTO_SUGGEST_MODE, false)?,
            arbitrary: attrs.get_or(attr::ARBITRARY, false)?,
            placeholder: attrs.get_as(attr::PLACEHOLDER)?,
            default_value: attrs.get_or(attr::DEFAULT_VALUE, String::new())?,
        })
    }
}

/// `false` (or nothing) means no limit.
fn selection_limit(attrs: &Attributes) -> Result<Option<u32>, ConfigError> {
    match attrs.get(attr::SELECTION_LIMIT) {
        None | Some(Value::Bool(false)) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(|e| ConfigError::invalid(attr::SELECTION_LIMIT, e)),
    }
}

fn extra_params(attrs: &Attributes) -> Result<BTreeMap<String, String>, ConfigError> {
    match attrs.get(attr::EXTRA_PARAMS) {
        None => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect()),
        Some(_) => Err(ConfigError::invalid(
            attr::EXTRA_PARAMS,
            "expected an object of query parameters",
        )),
    }
}

/// Current exclusion list. Anything but an array means "no exclusions".
#[must_use]
pub fn exclude_ids(attrs: &Attributes) -> Option<Vec<EntityId>> {
    match attrs.get(attr::EXCLUDE_IDS)? {
        Value::Array(items) => Some(items.into_iter().map(EntityId::Value).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(options: AttributeLayer) -> Attributes {
        Attributes::new(picker_defaults()).with_options(options)
    }

    #[test]
    fn missing_endpoint_is_fatal() {
        assert_eq!(
            PickerConfig::resolve(&attrs(AttributeLayer::new())),
            Err(ConfigError::MissingEndpoint)
        );
        assert_eq!(
            PickerConfig::resolve(&attrs(AttributeLayer::new().with(attr::API_URL, ""))),
            Err(ConfigError::MissingEndpoint)
        );
    }

    #[test]
    fn defaults_resolve() {
        let config =
            PickerConfig::resolve(&attrs(AttributeLayer::new().with(attr::API_URL, "/api/v1/users")))
                .unwrap();
        assert_eq!(config.id_field, "id");
        assert_eq!(config.name_field, "name");
        assert_eq!(config.retrieve_limit, 10);
        assert_eq!(config.selection_limit, None);
        assert_eq!(config.query_param, "q");
        assert!(config.escape_entities);
        assert_eq!(config.batch_size, 0);
        assert!(!config.implicit_sync);
        assert_eq!(config.height.as_deref(), Some("150%"));
        assert!(config.extra_params.is_empty());
    }

    #[test]
    fn params_override_options() {
        let attrs = attrs(
            AttributeLayer::new()
                .with(attr::API_URL, "/api/v1/groups")
                .with(attr::SELECTION_LIMIT, 3)
                .with(attr::EXTRA_PARAMS, json!({"type": "BUILT_IN", "expand": true})),
        )
        .with_params(AttributeLayer::new().with(attr::SELECTION_LIMIT, 1));
        let config = PickerConfig::resolve(&attrs).unwrap();
        assert_eq!(config.selection_limit, Some(1));
        assert_eq!(config.extra_params["type"], "BUILT_IN");
        assert_eq!(config.extra_params["expand"], "true");
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let bad = attrs(
            AttributeLayer::new()
                .with(attr::API_URL, "/api")
                .with(attr::EXTRA_PARAMS, json!(["a"])),
        );
        assert!(matches!(
            PickerConfig::resolve(&bad),
            Err(ConfigError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn exclude_ids_only_from_arrays() {
        let list = attrs(AttributeLayer::new().with(attr::EXCLUDE_IDS, json!(["a", 2])));
        assert_eq!(
            exclude_ids(&list),
            Some(vec![EntityId::from("a"), EntityId::from(2_i64)])
        );
        let scalar = attrs(AttributeLayer::new().with(attr::EXCLUDE_IDS, "a"));
        assert_eq!(exclude_ids(&scalar), None);
        assert_eq!(exclude_ids(&attrs(AttributeLayer::new())), None);
    }
}
