#![forbid(unsafe_code)]

//! The entity picker input.
//!
//! A text field backed by a remote search-and-select widget, bound to a
//! list-valued field on the host model. The picker keeps the selection in a
//! [`SelectionRegistry`], writes its ids back to the model after every
//! mutation, and raises `change:<field>` only when membership changed.
//!
//! # Lifecycle
//!
//! ```text
//! build ──► edit_mode ──► prefetch ─┬─► seed registry + widget ─► enable
//!   │                               └─► (error) ─────────────────► enable
//!   └─────► read_mode ──► prefetch ──► display names ─► form:resize
//! ```
//!
//! # Invariants
//!
//! 1. **Paired enable**: every disable in `edit_mode` is followed by an
//!    enable on both the success and the error path.
//! 2. **Snapshot order**: before-snapshot, mutate, write model,
//!    after-snapshot, notify.
//! 3. **Late results are inert**: prefetch callbacks hold a weak handle and
//!    the mode epoch they were issued in; after teardown or a later mode
//!    switch they do nothing.
//! 4. **Unborrowed callouts**: host events, widget calls and transport
//!    requests happen with the picker state released, so a listener may
//!    read the picker and a widget may call back into it.
//!
//! The model and the widget each sit in their own `RefCell`. While an event
//! is being raised the model is borrowed, so listeners should read the
//! picker ([`EntityPicker::val`] and friends) rather than
//! [`EntityPicker::with_model`]. A widget call made while the widget is
//! already mid-call is skipped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use formkit_core::{AttributeLayer, Attributes, ConfigError, Entity, EntityId, HostModel, ModelEvent};
use formkit_web::{Clock, Transport};
use serde_json::Value;

use crate::autosuggest::{Autosuggest, AutosuggestOptions};
use crate::change::ChangeNotifier;
use crate::config::{self, PickerConfig, picker_defaults};
use crate::events::{EventAction, InputEvents};
use crate::parser::{EntityParser, ParseFn};
use crate::prefetch::{PrefetchErrorFn, PrefetchOrchestrator, apply_seed, seed_widget};
use crate::registry::SelectionRegistry;
use crate::resize::ResizeDebouncer;

/// Which face the picker is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    /// Built but not yet rendered.
    Idle,
    /// Read-only list of names.
    Read,
    /// Live autosuggest widget.
    Edit,
}

/// Collects everything needed to build an [`EntityPicker`].
pub struct PickerBuilder<M> {
    name: String,
    model: M,
    defaults: AttributeLayer,
    options: AttributeLayer,
    params: AttributeLayer,
    parse: Option<ParseFn>,
    events: Vec<(String, EventAction)>,
}

impl<M: HostModel + 'static> PickerBuilder<M> {
    /// Start a picker bound to `name` on `model`.
    pub fn new(name: impl Into<String>, model: M) -> Self {
        Self {
            name: name.into(),
            model,
            defaults: AttributeLayer::new(),
            options: AttributeLayer::new(),
            params: AttributeLayer::new(),
            parse: None,
            events: Vec::new(),
        }
    }

    /// Component defaults layered over the shared picker defaults.
    #[must_use]
    pub fn defaults(mut self, layer: AttributeLayer) -> Self {
        self.defaults = self.defaults.merged(layer);
        self
    }

    /// Instance options.
    #[must_use]
    pub fn options(mut self, layer: AttributeLayer) -> Self {
        self.options = layer;
        self
    }

    /// Runtime params.
    #[must_use]
    pub fn params(mut self, layer: AttributeLayer) -> Self {
        self.params = layer;
        self
    }

    /// Custom record parse; escaping is still applied around it.
    #[must_use]
    pub fn parse_with(mut self, parse: impl Fn(Entity) -> Entity + 'static) -> Self {
        self.parse = Some(Rc::new(parse));
        self
    }

    /// Override the action for one input event.
    #[must_use]
    pub fn bind_event(mut self, event: impl Into<String>, action: EventAction) -> Self {
        self.events.push((event.into(), action));
        self
    }

    /// Resolve configuration and create the picker.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::MissingEndpoint`] (or an invalid attribute)
    /// before any picker state exists.
    pub fn build<W: Autosuggest + 'static>(
        self,
        transport: Rc<dyn Transport>,
        clock: Rc<dyn Clock>,
    ) -> Result<EntityPicker<M, W>, ConfigError> {
        let attributes = Attributes::new(picker_defaults().merged(self.defaults))
            .with_options(self.options)
            .with_params(self.params);
        let config = PickerConfig::resolve(&attributes)?;

        formkit_core::debug!(
            field = %self.name,
            endpoint = %config.endpoint,
            batch_size = config.batch_size,
            "picker built"
        );

        let mut registry = SelectionRegistry::new(config.id_field.as_str());
        registry.reset(self.model.model_value(&self.name).unwrap_or_default());
        let state = PickerState {
            registry,
            enabled: true,
            mode: PickerMode::Idle,
            epoch: 0,
            read_text: None,
            resize: ResizeDebouncer::default(),
        };
        let prefetcher = PrefetchOrchestrator::new(&config, transport);
        let shared = Shared {
            parser: EntityParser::new(config.id_field.as_str(), self.parse, config.escape_entities),
            notifier: ChangeNotifier::new(self.name.as_str()),
            events: InputEvents::merged(self.events),
            name: self.name,
            config,
            attributes,
            clock,
            state: RefCell::new(state),
            model: RefCell::new(self.model),
            widget: RefCell::new(None),
        };
        Ok(EntityPicker {
            shared: Rc::new(shared),
            prefetcher,
        })
    }
}

struct PickerState {
    registry: SelectionRegistry,
    enabled: bool,
    mode: PickerMode,
    epoch: u64,
    read_text: Option<String>,
    resize: ResizeDebouncer,
}

struct Shared<M, W> {
    name: String,
    config: PickerConfig,
    attributes: Attributes,
    parser: EntityParser,
    notifier: ChangeNotifier,
    events: InputEvents,
    clock: Rc<dyn Clock>,
    state: RefCell<PickerState>,
    model: RefCell<M>,
    widget: RefCell<Option<W>>,
}

impl<M: HostModel, W: Autosuggest> Shared<M, W> {
    fn stored_ids(&self) -> Vec<EntityId> {
        self.model
            .borrow()
            .model_value(&self.name)
            .unwrap_or_default()
    }

    fn write_model(&self, value: Vec<EntityId>) {
        self.model.borrow_mut().set_model_value(&self.name, value);
    }

    fn raise(&self, event: ModelEvent) {
        self.model.borrow_mut().trigger(event);
    }

    fn widget_call(&self, f: impl FnOnce(&mut W)) {
        match self.widget.try_borrow_mut() {
            Ok(mut guard) => {
                if let Some(widget) = &mut *guard {
                    f(widget);
                }
            }
            Err(_) => {
                formkit_core::debug!(field = %self.name, "widget busy, call skipped");
            }
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.borrow_mut().enabled = enabled;
        self.widget_call(|widget| widget.set_enabled(enabled));
    }

    fn parse_all(&self, raw: Vec<Value>) -> Vec<Entity> {
        let exclude = config::exclude_ids(&self.attributes);
        self.parser.parse_all(raw, exclude.as_deref())
    }

    fn string_value(&self, registry: &SelectionRegistry) -> String {
        let names = registry.display_names(&self.config.name_field);
        if names.is_empty() {
            self.config.default_value.clone()
        } else {
            names.join(", ")
        }
    }

    fn mutate(&self, change: impl FnOnce(&mut SelectionRegistry)) -> bool {
        let before = self.stored_ids();
        let value = {
            let mut state = self.state.borrow_mut();
            change(&mut state.registry);
            state.resize.request(self.clock.now_mono());
            state.registry.current_model_value().to_vec()
        };
        self.write_model(value);
        let after = self.stored_ids();
        match self.notifier.change_event(&before, &after) {
            Some(event) => {
                self.raise(event);
                true
            }
            None => false,
        }
    }

    fn finish_prefill(&self, records: Vec<Value>) {
        let entities = self.parse_all(records);
        let stored_len = self.stored_ids().len();
        let (outcome, synced_value) = {
            let mut state = self.state.borrow_mut();
            let outcome = apply_seed(
                &mut state.registry,
                entities,
                stored_len,
                self.config.implicit_sync,
            );
            let synced_value = outcome
                .synced
                .then(|| state.registry.current_model_value().to_vec());
            if outcome.synced {
                state.resize.request(self.clock.now_mono());
            }
            (outcome, synced_value)
        };
        formkit_core::debug!(
            field = %self.name,
            seeded = outcome.seeded.len(),
            synced = outcome.synced,
            "prefill complete"
        );
        if let Some(value) = synced_value {
            self.write_model(value);
        }
        self.widget_call(|widget| seed_widget(widget, &outcome.seeded, &self.config.id_field));
        self.set_enabled(true);
    }

    fn finish_read(&self, records: Vec<Value>) {
        let entities = self.parse_all(records);
        let stored = self.stored_ids();
        {
            let mut state = self.state.borrow_mut();
            state.registry.reset(stored);
            state.registry.replace_entities(entities);
            let text = self.string_value(&state.registry);
            state.read_text = Some(text);
            state.resize.cancel();
        }
        self.raise(ModelEvent::Resize);
    }
}

/// Run `f` if the picker is still alive and in the same mode epoch.
fn with_live<M, W>(weak: &Weak<Shared<M, W>>, epoch: u64, f: impl FnOnce(&Shared<M, W>)) {
    let Some(shared) = weak.upgrade() else {
        formkit_core::debug!("prefetch result after teardown ignored");
        return;
    };
    let current = shared.state.borrow().epoch;
    if current == epoch {
        f(&shared);
    } else {
        formkit_core::debug!(issued = epoch, current, "stale prefetch result ignored");
    }
}

/// List-valued input backed by a remote autosuggest widget.
pub struct EntityPicker<M, W> {
    shared: Rc<Shared<M, W>>,
    prefetcher: PrefetchOrchestrator,
}

impl<M: HostModel + 'static, W: Autosuggest + 'static> EntityPicker<M, W> {
    /// Model field this picker is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &PickerConfig {
        &self.shared.config
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> PickerMode {
        self.shared.state.borrow().mode
    }

    /// The picker's model value.
    #[must_use]
    pub fn val(&self) -> Vec<EntityId> {
        self.shared
            .state
            .borrow()
            .registry
            .current_model_value()
            .to_vec()
    }

    /// Ids of the entities the picker has resolved, in selection order.
    #[must_use]
    pub fn resolved_ids(&self) -> Vec<EntityId> {
        let field = &self.shared.config.id_field;
        let state = self.shared.state.borrow();
        state.registry.entities().iter().map(|e| e.id(field)).collect()
    }

    /// Whether the search box accepts input.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared.state.borrow().enabled
    }

    /// Configured CSS height.
    #[must_use]
    pub fn height(&self) -> Option<&str> {
        self.shared.config.height.as_deref()
    }

    /// Selected names joined by `", "`, or the default value.
    #[must_use]
    pub fn to_string_value(&self) -> String {
        let state = self.shared.state.borrow();
        self.shared.string_value(&state.registry)
    }

    /// Text rendered by the last completed read mode.
    #[must_use]
    pub fn read_text(&self) -> Option<String> {
        self.shared.state.borrow().read_text.clone()
    }

    /// How the input treats a DOM event.
    #[must_use]
    pub fn event_action(&self, event: &str) -> EventAction {
        self.shared.events.action(event)
    }

    /// Whether a resize notification is waiting for [`EntityPicker::tick`].
    #[must_use]
    pub fn resize_pending(&self) -> bool {
        self.shared.state.borrow().resize.is_pending()
    }

    /// Inspect the host model.
    pub fn with_model<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&*self.shared.model.borrow())
    }

    /// Inspect the live widget, if in edit mode.
    pub fn with_widget<R>(&self, f: impl FnOnce(Option<&W>) -> R) -> R {
        f(self.shared.widget.borrow().as_ref())
    }

    /// Enter edit mode: build the widget, then prefill it from the model.
    ///
    /// Returns the number of prefetch requests issued.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn edit_mode(&self, make_widget: impl FnOnce(&AutosuggestOptions) -> W) -> usize {
        let shared = &self.shared;
        let span = formkit_core::debug_span!("picker.edit_mode", field = %shared.name);
        let _guard = span.enter();

        let widget = make_widget(&AutosuggestOptions::from_config(&shared.config));
        let retired = shared.widget.replace(Some(widget));
        drop(retired);

        let ids = shared.stored_ids();
        let epoch = {
            let mut state = shared.state.borrow_mut();
            state.mode = PickerMode::Edit;
            state.read_text = None;
            state.epoch += 1;
            state.registry.reset(ids.clone());
            state.epoch
        };
        shared.set_enabled(false);

        let on_success = {
            let weak = Rc::downgrade(shared);
            move |records: Vec<Value>| with_live(&weak, epoch, |shared| shared.finish_prefill(records))
        };
        let on_error: PrefetchErrorFn = {
            let weak = Rc::downgrade(shared);
            Box::new(move |error| {
                with_live(&weak, epoch, |shared| {
                    formkit_core::warn!(field = %shared.name, error = %error, "prefill failed");
                    shared.set_enabled(true);
                });
            })
        };
        self.prefetcher
            .prefetch(Some(ids.as_slice()), on_success, Some(on_error))
    }

    /// Enter read mode: resolve the stored ids and render their names.
    ///
    /// Returns the number of prefetch requests issued.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn read_mode(&self) -> usize {
        let shared = &self.shared;
        let retired = shared.widget.replace(None);
        drop(retired);

        let ids = shared.stored_ids();
        let epoch = {
            let mut state = shared.state.borrow_mut();
            state.mode = PickerMode::Read;
            state.read_text = None;
            state.enabled = true;
            state.epoch += 1;
            state.epoch
        };

        let on_success = {
            let weak = Rc::downgrade(shared);
            move |records: Vec<Value>| with_live(&weak, epoch, |shared| shared.finish_read(records))
        };
        let on_error: PrefetchErrorFn = {
            let weak = Rc::downgrade(shared);
            Box::new(move |error| {
                with_live(&weak, epoch, |shared| {
                    formkit_core::warn!(field = %shared.name, error = %error, "read-mode prefetch failed");
                });
            })
        };
        self.prefetcher
            .prefetch(Some(ids.as_slice()), on_success, Some(on_error))
    }

    /// Widget callback: raw search results arrived. Returns what to display.
    pub fn on_results_ready(&self, raw: Vec<Value>) -> Vec<Entity> {
        self.shared.parse_all(raw)
    }

    /// Widget callback: the user picked `entity`.
    ///
    /// Returns the id to tag the selection bubble with, or `None` in
    /// autosuggest mode, where the pick is published as `select:<field>`
    /// instead of being selected.
    pub fn on_selection_added(&self, entity: Entity) -> Option<EntityId> {
        let shared = &self.shared;
        if shared.config.auto_suggest_mode {
            shared.widget_call(|widget| widget.clear_values_input());
            shared.raise(ModelEvent::Select {
                field: shared.name.clone(),
                entity,
            });
            return None;
        }
        let id = entity.id(&shared.config.id_field);
        shared.mutate(|registry| {
            registry.add(entity);
        });
        Some(id)
    }

    /// Widget callback: the user removed the bubble tagged `id`.
    pub fn on_selection_removed(&self, id: &EntityId) -> bool {
        self.remove_entity(id)
    }

    /// Select `entity`. Returns whether `change:<field>` fired.
    pub fn add_entity(&self, entity: Entity) -> bool {
        self.shared.mutate(|registry| {
            registry.add(entity);
        })
    }

    /// Deselect `id`. Returns whether `change:<field>` fired.
    pub fn remove_entity(&self, id: &EntityId) -> bool {
        self.shared.mutate(|registry| {
            registry.remove(id);
        })
    }

    /// Fire a pending resize if its quiet period has elapsed.
    pub fn tick(&self) -> bool {
        let fired = {
            let mut state = self.shared.state.borrow_mut();
            let now = self.shared.clock.now_mono();
            let fired = state.resize.poll(now);
            if fired {
                formkit_core::debug!(
                    field = %self.shared.name,
                    coalesced = state.resize.coalesced(),
                    "resize fired"
                );
            }
            fired
        };
        if fired {
            self.shared.raise(ModelEvent::Resize);
        }
        fired
    }

    /// Tear the picker down. In-flight prefetches complete into nothing.
    pub fn teardown(self) {
        formkit_core::debug!(field = %self.shared.name, "picker torn down");
    }
}

impl<M, W> fmt::Debug for EntityPicker<M, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("EntityPicker")
            .field("name", &self.shared.name)
            .field("mode", &state.mode)
            .field("enabled", &state.enabled)
            .field("value", &state.registry.current_model_value())
            .finish_non_exhaustive()
    }
}
