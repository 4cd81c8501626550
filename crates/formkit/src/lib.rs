#![forbid(unsafe_code)]

//! Formkit public facade crate.
//!
//! Re-exports the types a host page needs to mount entity pickers, plus a
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use formkit_core::{
    AttributeLayer, AttributeValue, Attributes, ConfigError, Entity, EntityId, HostModel, Layer,
    MemoryModel, ModelEvent,
};

// --- Web re-exports --------------------------------------------------------

pub use formkit_web::{
    BatchFetcher, Clock, DeterministicClock, FetchRequest, QueuedTransport, Transport,
    TransportError,
};

// --- Widget re-exports -----------------------------------------------------

pub use formkit_widgets::config::attr;
pub use formkit_widgets::{
    Autosuggest, AutosuggestOptions, EntityPicker, EventAction, PickerBuilder, PickerConfig,
    PickerMode,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for formkit hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Picker attributes could not be resolved.
    Config(ConfigError),
    /// A remote lookup failed.
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Transport(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Standard result type for formkit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AttributeLayer, Autosuggest, Entity, EntityId, EntityPicker, Error, HostModel,
        PickerBuilder, Result, Transport, attr,
    };

    pub use crate::{core, web, widgets};
}

pub use formkit_core as core;
pub use formkit_web as web;
pub use formkit_widgets as widgets;
