#![forbid(unsafe_code)]

use std::rc::Rc;

use formkit::prelude::*;
use formkit::{ConfigError, DeterministicClock, MemoryModel, QueuedTransport, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Chips(Vec<EntityId>);

impl Autosuggest for Chips {
    fn add_initial_selection(&mut self, _entity: &Entity, id: &EntityId) {
        self.0.push(id.clone());
    }
}

fn mount(model: MemoryModel, options: AttributeLayer) -> Result<(EntityPicker<MemoryModel, Chips>, Rc<QueuedTransport>)> {
    let transport = Rc::new(QueuedTransport::new());
    let picker = PickerBuilder::new("reviewers", model)
        .options(options)
        .build(transport.clone(), Rc::new(DeterministicClock::new()))?;
    Ok((picker, transport))
}

#[test]
fn config_errors_convert_into_facade_error() {
    let err = mount(MemoryModel::new(), AttributeLayer::new()).unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::MissingEndpoint));
    assert_eq!(err.to_string(), "api url not provided");
}

#[test]
fn transport_errors_convert_into_facade_error() {
    let err: Error = TransportError::Network("offline".into()).into();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn prelude_is_enough_to_mount_a_picker() {
    let model = MemoryModel::new().with_value("reviewers", ["r1"]);
    let (picker, transport) = mount(
        model,
        AttributeLayer::new().with(attr::API_URL, "/api/v1/users"),
    )
    .unwrap();

    picker.edit_mode(|_| Chips(Vec::new()));
    transport.complete_next(Ok(vec![json!({"id": "r1", "name": "Rita"})]));

    assert_eq!(picker.to_string_value(), "Rita");
    picker.with_widget(|chips| assert_eq!(chips.map(|c| c.0.len()), Some(1)));
}
