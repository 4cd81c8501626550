#![forbid(unsafe_code)]

//! Contract with the third-party autosuggest widget.
//!
//! The widget itself is a black box owned by the host. The picker hands it
//! an [`AutosuggestOptions`] at construction and later pushes pre-selected
//! items into it; the host routes the widget's callbacks back to
//! [`EntityPicker::on_results_ready`], [`EntityPicker::on_selection_added`]
//! and [`EntityPicker::on_selection_removed`].
//!
//! [`EntityPicker::on_results_ready`]: crate::picker::EntityPicker::on_results_ready
//! [`EntityPicker::on_selection_added`]: crate::picker::EntityPicker::on_selection_added
//! [`EntityPicker::on_selection_removed`]: crate::picker::EntityPicker::on_selection_removed

use formkit_core::{Entity, EntityId};
use formkit_web::FetchRequest;

use crate::config::PickerConfig;

/// Construction options for the autosuggest widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosuggestOptions {
    /// Search endpoint.
    pub endpoint: String,
    /// Field the widget uses as the selected value.
    pub id_field: String,
    /// Field the widget displays and searches.
    pub name_field: String,
    /// Search result cap.
    pub retrieve_limit: u32,
    /// Maximum selections, `None` for unlimited.
    pub selection_limit: Option<u32>,
    /// Name of the search query parameter.
    pub query_param: String,
    /// Extra parameters pre-encoded as `&k=v&...`, when any are configured.
    pub extra_params: Option<String>,
    /// Start text shown in the empty search box.
    pub placeholder: Option<String>,
    /// Allow free-text entries.
    pub arbitrary: bool,
}

impl AutosuggestOptions {
    /// Derive widget options from a resolved picker configuration.
    #[must_use]
    pub fn from_config(config: &PickerConfig) -> Self {
        let extra_params = (!config.extra_params.is_empty()).then(|| {
            let request = config
                .extra_params
                .iter()
                .fold(FetchRequest::new(config.endpoint.as_str()), |request, (k, v)| {
                    request.with_param(k.as_str(), v.as_str())
                });
            format!("&{}", request.query_string())
        });
        Self {
            endpoint: config.endpoint.clone(),
            id_field: config.id_field.clone(),
            name_field: config.name_field.clone(),
            retrieve_limit: config.retrieve_limit,
            selection_limit: config.selection_limit,
            query_param: config.query_param.clone(),
            extra_params,
            placeholder: config.placeholder.clone(),
            arbitrary: config.arbitrary,
        }
    }
}

/// Operations the picker performs on a live autosuggest widget.
pub trait Autosuggest {
    /// Show `entity` as already selected, keyed by `id`.
    fn add_initial_selection(&mut self, entity: &Entity, id: &EntityId);

    /// Enable or disable the search box.
    fn set_enabled(&mut self, enabled: bool) {
        let _ = enabled;
    }

    /// Reset the hidden values input so the placeholder shows again.
    fn clear_values_input(&mut self) {}
}
