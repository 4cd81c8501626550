#![forbid(unsafe_code)]

//! Transport contract and a host-driven queue implementation.
//!
//! A [`Transport`] accepts a GET request and a completion callback. It must
//! never invoke the callback re-entrantly from inside `get` unless it has
//! truly finished the request (synchronous test doubles may do so).
//!
//! [`QueuedTransport`] parks every request until the host completes it,
//! which lets the embedding environment perform the real I/O and lets tests
//! control completion order.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde_json::Value;
use url::form_urlencoded;

/// A GET request against a collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Endpoint URL without query string.
    pub url: String,
    /// Query parameters, sorted by name.
    pub query: BTreeMap<String, String>,
}

impl FetchRequest {
    /// Create a request with no parameters.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: BTreeMap::new(),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish()
    }

    /// URL with the encoded query string appended.
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{sep}{}", self.url, self.query_string())
    }
}

/// Failure of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The request never produced a response.
    Network(String),
    /// The response body was not a JSON array of records.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { code, .. } => write!(f, "server responded with status {code}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Decode(msg) => write!(f, "invalid response body: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Outcome of a request: the decoded record list.
pub type FetchResult = Result<Vec<Value>, TransportError>;

/// Completion callback handed to a transport.
pub type FetchCallback = Box<dyn FnOnce(FetchResult)>;

/// Decode a response body into a record list.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] when the body is not a JSON array.
pub fn decode_body(body: &str) -> FetchResult {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(other) => Err(TransportError::Decode(format!(
            "expected an array, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(TransportError::Decode(e.to_string())),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Issues GET requests on behalf of an input.
pub trait Transport {
    /// Start a request; `done` is invoked exactly once when it settles.
    fn get(&self, request: FetchRequest, done: FetchCallback);
}

struct Pending {
    request: FetchRequest,
    done: FetchCallback,
}

/// Transport that parks requests until the host completes them.
#[derive(Default)]
pub struct QueuedTransport {
    pending: RefCell<VecDeque<Pending>>,
    sent: Cell<usize>,
}

impl QueuedTransport {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of requests ever issued.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.get()
    }

    /// Number of requests awaiting completion.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Snapshot of the requests awaiting completion, oldest first.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<FetchRequest> {
        self.pending
            .borrow()
            .iter()
            .map(|p| p.request.clone())
            .collect()
    }

    /// Settle the pending request at `index` (0 = oldest).
    ///
    /// Returns `false` if there is no such request. The callback runs after
    /// the queue borrow is released, so it may issue new requests.
    pub fn complete_at(&self, index: usize, result: FetchResult) -> bool {
        let entry = self.pending.borrow_mut().remove(index);
        match entry {
            Some(pending) => {
                (pending.done)(result);
                true
            }
            None => false,
        }
    }

    /// Settle the oldest pending request.
    pub fn complete_next(&self, result: FetchResult) -> bool {
        self.complete_at(0, result)
    }

    /// Settle the request at `index` with a raw response body.
    pub fn respond_at(&self, index: usize, body: &str) -> bool {
        self.complete_at(index, decode_body(body))
    }

    /// Fail every pending request with the same error.
    pub fn fail_all(&self, error: &TransportError) -> usize {
        let drained: Vec<Pending> = self.pending.borrow_mut().drain(..).collect();
        let count = drained.len();
        for pending in drained {
            (pending.done)(Err(error.clone()));
        }
        count
    }
}

impl Transport for QueuedTransport {
    fn get(&self, request: FetchRequest, done: FetchCallback) {
        formkit_core::trace!(url = %request.full_url(), "request queued");
        self.sent.set(self.sent.get() + 1);
        self.pending
            .borrow_mut()
            .push_back(Pending { request, done });
    }
}

impl fmt::Debug for QueuedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTransport")
            .field("pending", &self.pending_requests())
            .field("sent", &self.sent.get())
            .finish()
    }
}
