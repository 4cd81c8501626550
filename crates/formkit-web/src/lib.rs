#![forbid(unsafe_code)]

//! `formkit-web` provides the host-driven collaborators a picker talks to.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) performs requests
//!   and pushes completions back in whatever order the network delivers them.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.

pub mod batch;
pub mod transport;

use core::time::Duration;
use std::cell::Cell;

pub use batch::{BatchFetcher, BatchRequest, QueryBuilder};
pub use transport::{
    FetchCallback, FetchRequest, FetchResult, QueuedTransport, Transport, TransportError,
};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
///
/// Interior mutability lets the host keep advancing a clock it has already
/// shared with inputs through an `Rc`.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Cell<Duration>,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
        }
    }

    /// Set current monotonic time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now.get()
    }
}
