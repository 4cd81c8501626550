#![forbid(unsafe_code)]

//! Fetch-by-id with server query-size limits.
//!
//! Collection endpoints cap how many `or` clauses a filter may carry, so an
//! id list is split into chunks of at most `batch_size` ids. Each chunk is
//! one request; the record lists are concatenated in chunk order no matter
//! which request finishes first.
//!
//! # Invariants
//!
//! - `batch_size == 0` means a single unbatched request.
//! - The completion callback runs exactly once: with the concatenated
//!   records once every chunk succeeded, or with the first error.
//! - An empty id list completes immediately with no requests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use formkit_core::EntityId;
use serde_json::Value;

use crate::transport::{FetchCallback, FetchRequest, FetchResult, Transport};

/// Builds the query parameters for one chunk of ids.
pub type QueryBuilder<'a> = &'a dyn Fn(&[EntityId]) -> BTreeMap<String, String>;

/// What to fetch.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    /// Collection endpoint.
    pub endpoint: &'a str,
    /// Maximum ids per request; `0` disables batching.
    pub batch_size: usize,
    /// Ids to resolve, in order.
    pub ids: &'a [EntityId],
}

impl BatchRequest<'_> {
    /// Split the ids into request-sized chunks.
    pub fn chunks(&self) -> impl Iterator<Item = &[EntityId]> {
        let size = if self.batch_size == 0 {
            self.ids.len().max(1)
        } else {
            self.batch_size
        };
        self.ids.chunks(size)
    }
}

struct Assembly {
    slots: Vec<Option<Vec<Value>>>,
    remaining: usize,
    done: Option<FetchCallback>,
}

impl Assembly {
    /// Record one chunk outcome; returns the callback and final result once settled.
    fn settle(&mut self, index: usize, result: FetchResult) -> Option<(FetchCallback, FetchResult)> {
        // Already settled by an earlier failure.
        self.done.as_ref()?;
        match result {
            Err(e) => self.done.take().map(|done| (done, Err(e))),
            Ok(records) => {
                self.slots[index] = Some(records);
                self.remaining -= 1;
                if self.remaining > 0 {
                    return None;
                }
                let merged = self.slots.iter_mut().flat_map(|s| s.take().unwrap_or_default());
                let merged: Vec<Value> = merged.collect();
                self.done.take().map(|done| (done, Ok(merged)))
            }
        }
    }
}

/// Issues chunked fetch-by-id requests over a [`Transport`].
#[derive(Clone)]
pub struct BatchFetcher {
    transport: Rc<dyn Transport>,
}

impl BatchFetcher {
    /// Create a fetcher over a shared transport.
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Resolve `request.ids` and hand the concatenated records to `done`.
    ///
    /// Returns the number of requests issued.
    pub fn get_by_ids(
        &self,
        request: BatchRequest<'_>,
        build_query: QueryBuilder<'_>,
        done: FetchCallback,
    ) -> usize {
        if request.ids.is_empty() {
            done(Ok(Vec::new()));
            return 0;
        }

        let chunks: Vec<&[EntityId]> = request.chunks().collect();
        let total = chunks.len();
        formkit_core::debug!(
            endpoint = request.endpoint,
            ids = request.ids.len(),
            chunks = total,
            "batch fetch"
        );

        let assembly = Rc::new(RefCell::new(Assembly {
            slots: vec![None; total],
            remaining: total,
            done: Some(done),
        }));

        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut fetch = FetchRequest::new(request.endpoint);
            fetch.query = build_query(chunk);
            let assembly = Rc::clone(&assembly);
            self.transport.get(
                fetch,
                Box::new(move |result| {
                    let settled = assembly.borrow_mut().settle(index, result);
                    if let Some((done, result)) = settled {
                        if let Err(e) = &result {
                            formkit_core::warn!(chunk = index, error = %e, "batch fetch failed");
                        }
                        done(result);
                    }
                }),
            );
        }
        total
    }
}

impl std::fmt::Debug for BatchFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFetcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{QueuedTransport, TransportError};

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn ids(values: &[i64]) -> Vec<EntityId> {
        values.iter().map(|&v| EntityId::from(v)).collect()
    }

    fn joined(chunk: &[EntityId]) -> BTreeMap<String, String> {
        let text: Vec<String> = chunk.iter().map(ToString::to_string).collect();
        BTreeMap::from([("ids".to_owned(), text.join(","))])
    }

    #[test]
    fn zero_batch_size_is_one_chunk() {
        let ids = ids(&[1, 2, 3, 4, 5]);
        let req = BatchRequest {
            endpoint: "/api",
            batch_size: 0,
            ids: &ids,
        };
        assert_eq!(req.chunks().count(), 1);
    }

    #[test]
    fn first_failure_wins_and_success_is_suppressed() {
        let transport = Rc::new(QueuedTransport::new());
        let fetcher = BatchFetcher::new(transport.clone());
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&outcomes);
        let ids = ids(&[1, 2, 3]);
        let issued = fetcher.get_by_ids(
            BatchRequest {
                endpoint: "/api",
                batch_size: 1,
                ids: &ids,
            },
            &joined,
            Box::new(move |r| sink.borrow_mut().push(r)),
        );
        assert_eq!(issued, 3);

        transport.complete_at(1, Err(TransportError::Network("reset".into())));
        transport.complete_next(Ok(vec![json!({"id": 1})]));
        transport.complete_next(Ok(vec![json!({"id": 3})]));

        assert_eq!(
            *outcomes.borrow(),
            vec![Err(TransportError::Network("reset".into()))]
        );
    }

    proptest! {
        #[test]
        fn chunks_cover_ids_in_order(len in 0usize..40, size in 0usize..8) {
            let ids: Vec<EntityId> = (0..len as i64).map(EntityId::from).collect();
            let req = BatchRequest { endpoint: "/api", batch_size: size, ids: &ids };
            let chunks: Vec<&[EntityId]> = req.chunks().collect();
            if size > 0 {
                prop_assert!(chunks.iter().all(|c| c.len() <= size));
            } else {
                prop_assert!(chunks.len() <= 1);
            }
            let flat: Vec<EntityId> = chunks.concat();
            prop_assert_eq!(flat, ids);
        }
    }
}
