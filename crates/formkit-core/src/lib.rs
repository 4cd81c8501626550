#![forbid(unsafe_code)]

//! Core: entity shapes, id values, escaping, layered attribute resolution,
//! and the host-model contract shared by every formkit input.

pub mod attributes;
pub mod entity;
pub mod error;
pub mod escape;
pub mod id;
pub mod logging;
pub mod model;

pub use attributes::{AttributeLayer, AttributeValue, Attributes, Layer};
pub use entity::Entity;
pub use error::ConfigError;
pub use id::EntityId;
pub use model::{HostModel, MemoryModel, ModelEvent};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
