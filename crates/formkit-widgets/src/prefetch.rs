#![forbid(unsafe_code)]

//! Resolving stored ids into entities.
//!
//! The host model only stores ids, but the widget must show names. On entry
//! to edit (or read) mode the picker asks the server for the records behind
//! those ids, using one `or` filter per chunk:
//!
//! ```text
//! filter = id eq "A" or id eq "B" or id eq "C"
//! ```
//!
//! [`apply_seed`] then loads the parsed entities into the registry, and
//! [`seed_widget`] shows the accepted ones in the widget. With implicit sync
//! on, a model value that references more ids than the server resolved is
//! cut down to the resolved ones; missing entities are never invented.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | No stored ids | success with `[]`, no request |
//! | Any chunk fails | error callback once, success never runs |
//! | Server resolves fewer ids | implicit sync (if enabled), else ids kept |

use std::collections::BTreeMap;
use std::rc::Rc;

use formkit_core::{Entity, EntityId};
use formkit_web::{BatchFetcher, BatchRequest, Transport, TransportError};
use serde_json::Value;

use crate::autosuggest::Autosuggest;
use crate::config::PickerConfig;
use crate::registry::SelectionRegistry;

/// Error continuation for [`PrefetchOrchestrator::prefetch`].
pub type PrefetchErrorFn = Box<dyn FnOnce(TransportError)>;

/// Builds and issues prefetch requests.
#[derive(Debug, Clone)]
pub struct PrefetchOrchestrator {
    fetcher: BatchFetcher,
    endpoint: String,
    id_field: String,
    batch_size: usize,
    extra_params: BTreeMap<String, String>,
}

impl PrefetchOrchestrator {
    /// Create an orchestrator for a resolved configuration.
    #[must_use]
    pub fn new(config: &PickerConfig, transport: Rc<dyn Transport>) -> Self {
        Self {
            fetcher: BatchFetcher::new(transport),
            endpoint: config.endpoint.clone(),
            id_field: config.id_field.clone(),
            batch_size: config.batch_size,
            extra_params: config.extra_params.clone(),
        }
    }

    /// Query for one chunk: the extra params plus an id disjunction filter.
    #[must_use]
    pub fn build_prefetch_query(&self, ids: &[EntityId]) -> BTreeMap<String, String> {
        let clauses: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{} eq "{id}""#, self.id_field))
            .collect();
        let mut query = self.extra_params.clone();
        query.insert("filter".to_owned(), clauses.join(" or "));
        query
    }

    /// Fetch the records behind `ids`.
    ///
    /// `on_success` runs synchronously with `[]` when there is nothing to
    /// fetch. Returns the number of requests issued.
    pub fn prefetch(
        &self,
        ids: Option<&[EntityId]>,
        on_success: impl FnOnce(Vec<Value>) + 'static,
        on_error: Option<PrefetchErrorFn>,
    ) -> usize {
        let ids = ids.unwrap_or_default();
        if ids.is_empty() {
            on_success(Vec::new());
            return 0;
        }

        let span = formkit_core::debug_span!("picker.prefetch", ids = ids.len());
        let _guard = span.enter();
        let build = |chunk: &[EntityId]| self.build_prefetch_query(chunk);
        self.fetcher.get_by_ids(
            BatchRequest {
                endpoint: &self.endpoint,
                batch_size: self.batch_size,
                ids,
            },
            &build,
            Box::new(move |result| match result {
                Ok(records) => on_success(records),
                Err(error) => {
                    if let Some(on_error) = on_error {
                        on_error(error);
                    }
                }
            }),
        )
    }
}

/// What [`apply_seed`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedOutcome {
    /// Entities the registry accepted, in record order.
    pub seeded: Vec<Entity>,
    /// Whether implicit sync rewrote the model value.
    pub synced: bool,
}

/// Load prefetched entities into the registry.
///
/// Records the registry rejects (repeats, ids outside the model value) are
/// dropped; only [`SeedOutcome::seeded`] should reach the widget.
/// `stored_len` is the length of the host model value at completion.
pub fn apply_seed(
    registry: &mut SelectionRegistry,
    entities: Vec<Entity>,
    stored_len: usize,
    implicit_sync: bool,
) -> SeedOutcome {
    let mut outcome = SeedOutcome::default();
    for entity in entities {
        if registry.seed(entity.clone()) {
            outcome.seeded.push(entity);
        }
    }
    if implicit_sync && stored_len > registry.entities().len() {
        outcome.synced = registry.sync_model_to_entities();
        formkit_core::info!(
            stored = stored_len,
            resolved = registry.entities().len(),
            "implicit sync trimmed model value"
        );
    }
    outcome
}

/// Show seeded entities as pre-selected bubbles.
pub fn seed_widget<W: Autosuggest + ?Sized>(widget: &mut W, seeded: &[Entity], id_field: &str) {
    for entity in seeded {
        widget.add_initial_selection(entity, &entity.id(id_field));
    }
}
