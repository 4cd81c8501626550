#![forbid(unsafe_code)]

//! Form inputs backed by remote search-and-select widgets.
//!
//! The centerpiece is [`picker::EntityPicker`], a list-valued input whose
//! selection is kept in a [`registry::SelectionRegistry`] and mirrored onto
//! the host model. The pieces it is built from are usable on their own:
//!
//! - [`parser::EntityParser`] normalizes server records
//! - [`change`] decides whether a mutation changed the selection
//! - [`prefetch::PrefetchOrchestrator`] resolves stored ids into entities
//! - [`resize::ResizeDebouncer`] coalesces resize notifications

pub mod autosuggest;
pub mod change;
pub mod config;
pub mod events;
pub mod parser;
pub mod picker;
pub mod prefetch;
pub mod registry;
pub mod resize;

pub use autosuggest::{Autosuggest, AutosuggestOptions};
pub use change::ChangeNotifier;
pub use config::PickerConfig;
pub use events::{EventAction, InputEvents};
pub use parser::{EntityParser, ParseFn};
pub use picker::{EntityPicker, PickerBuilder, PickerMode};
pub use prefetch::PrefetchOrchestrator;
pub use registry::SelectionRegistry;
pub use resize::ResizeDebouncer;
