#![forbid(unsafe_code)]
#![cfg(feature = "tracing")]

//! Span and event instrumentation tests.
//!
//!   cargo test -p formkit-widgets --features tracing --test tracing_tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use formkit_core::{AttributeLayer, Entity, EntityId, MemoryModel};
use formkit_web::{DeterministicClock, QueuedTransport};
use formkit_widgets::config::attr;
use formkit_widgets::{Autosuggest, EntityPicker, PickerBuilder};
use serde_json::json;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    message: String,
    fields: HashMap<String, String>,
}

#[derive(Default, Clone)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn span(&self, name: &str) -> Option<CapturedSpan> {
        self.spans().into_iter().find(|s| s.name == name)
    }

    fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    fn event(&self, message: &str) -> Option<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.message == message)
            .cloned()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        if let Some(message) = fields.remove("message") {
            self.events
                .lock()
                .unwrap()
                .push(CapturedEvent { message, fields });
        }
    }
}

fn with_captured<F: FnOnce()>(f: F) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

struct NullWidget;

impl Autosuggest for NullWidget {
    fn add_initial_selection(&mut self, _entity: &Entity, _id: &EntityId) {}
}

fn picker(
    stored: &[&str],
    transport: &Rc<QueuedTransport>,
) -> EntityPicker<Rc<RefCell<MemoryModel>>, NullWidget> {
    let model = Rc::new(RefCell::new(
        MemoryModel::new().with_value("owners", stored.iter().copied()),
    ));
    PickerBuilder::new("owners", model)
        .options(
            AttributeLayer::new()
                .with(attr::API_URL, "/api/v1/users")
                .with(attr::IMPLICIT_SYNC, true),
        )
        .build(transport.clone(), Rc::new(DeterministicClock::new()))
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn prefetch_span_nests_under_edit_mode() {
    let transport = Rc::new(QueuedTransport::new());
    let capture = with_captured(|| {
        let picker = picker(&["u1", "u2"], &transport);
        picker.edit_mode(|_| NullWidget);
    });

    let edit = capture.span("picker.edit_mode").expect("edit_mode span");
    assert_eq!(edit.fields.get("field").map(String::as_str), Some("owners"));

    let prefetch = capture.span("picker.prefetch").expect("prefetch span");
    assert_eq!(prefetch.fields.get("ids").map(String::as_str), Some("2"));
    assert_eq!(prefetch.parent_name.as_deref(), Some("picker.edit_mode"));
}

#[test]
fn empty_model_skips_prefetch_span() {
    let transport = Rc::new(QueuedTransport::new());
    let capture = with_captured(|| {
        let picker = picker(&[], &transport);
        assert_eq!(picker.edit_mode(|_| NullWidget), 0);
    });
    assert!(capture.span("picker.prefetch").is_none());
    assert!(capture.span("picker.edit_mode").is_some());
}

#[test]
fn implicit_sync_is_logged() {
    let transport = Rc::new(QueuedTransport::new());
    let capture = with_captured(|| {
        let picker = picker(&["u1", "u2"], &transport);
        picker.edit_mode(|_| NullWidget);
        transport.complete_next(Ok(vec![json!({"id": "u1", "name": "Ada"})]));
    });
    let messages = capture.messages();
    assert!(
        messages.iter().any(|m| m == "implicit sync trimmed model value"),
        "messages: {messages:?}"
    );
}

#[test]
fn late_result_after_teardown_is_logged() {
    let transport = Rc::new(QueuedTransport::new());
    let capture = with_captured(|| {
        let picker = picker(&["u1"], &transport);
        picker.edit_mode(|_| NullWidget);
        picker.teardown();
        transport.complete_next(Ok(Vec::new()));
    });
    assert!(
        capture
            .messages()
            .iter()
            .any(|m| m == "prefetch result after teardown ignored")
    );
}

#[test]
fn edit_mode_span_is_a_root() {
    let transport = Rc::new(QueuedTransport::new());
    let capture = with_captured(|| {
        picker(&["u1"], &transport).edit_mode(|_| NullWidget);
    });
    let edit = capture.span("picker.edit_mode").expect("edit_mode span");
    assert_eq!(edit.parent_name, None);
}

#[test]
fn resize_event_reports_coalesced_requests() {
    let clock = Rc::new(DeterministicClock::new());
    let capture = with_captured(|| {
        let picker = PickerBuilder::new("owners", MemoryModel::new())
            .options(AttributeLayer::new().with(attr::API_URL, "/api/v1/users"))
            .build::<NullWidget>(Rc::new(QueuedTransport::new()), clock.clone())
            .unwrap();
        picker.add_entity(Entity::new().with("id", "u1"));
        picker.add_entity(Entity::new().with("id", "u2"));
        clock.advance(Duration::from_millis(50));
        assert!(picker.tick());
    });
    let fired = capture.event("resize fired").expect("resize event");
    assert_eq!(fired.fields.get("coalesced").map(String::as_str), Some("2"));
}
