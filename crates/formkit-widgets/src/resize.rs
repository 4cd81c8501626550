#![forbid(unsafe_code)]

//! Trailing-edge debouncing of resize notifications.
//!
//! Each selection change may alter the input's height, and hosts re-layout
//! dialogs on `form:resize`. A burst of changes should produce one
//! notification, [`DEFAULT_RESIZE_DELAY`] after the last change.
//!
//! Time is supplied by the caller, so behavior is deterministic:
//!
//! ```
//! use std::time::Duration;
//! use formkit_widgets::resize::ResizeDebouncer;
//!
//! let mut debouncer = ResizeDebouncer::default();
//! debouncer.request(Duration::from_millis(0));
//! debouncer.request(Duration::from_millis(30));
//! assert!(!debouncer.poll(Duration::from_millis(60)));
//! assert!(debouncer.poll(Duration::from_millis(80)));
//! assert!(!debouncer.poll(Duration::from_millis(200)));
//! ```
//!
//! # Invariants
//!
//! - **Latest-wins**: every request pushes the deadline out.
//! - **At most once per burst**: `poll` fires once, then clears.

use std::time::Duration;

/// Quiet period before a pending resize fires.
pub const DEFAULT_RESIZE_DELAY: Duration = Duration::from_millis(50);

/// Coalesces resize requests into one trailing notification.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    deadline: Option<Duration>,
    coalesced: u32,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DELAY)
    }
}

impl ResizeDebouncer {
    /// Create a debouncer with a custom quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            coalesced: 0,
        }
    }

    /// Ask for a resize at `now`. Returns `true` if this starts a new burst.
    pub fn request(&mut self, now: Duration) -> bool {
        let fresh = self.deadline.is_none();
        self.deadline = Some(now.saturating_add(self.delay));
        self.coalesced = if fresh { 1 } else { self.coalesced.saturating_add(1) };
        fresh
    }

    /// Fire if the quiet period has elapsed at `now`.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a resize is waiting to fire.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Requests folded into the current (or last) burst.
    #[must_use]
    pub const fn coalesced(&self) -> u32 {
        self.coalesced
    }

    /// Drop any pending resize.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
