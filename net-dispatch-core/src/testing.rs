//! Test helpers for data-layer apps
//!
//! [`MockTransport`] scripts transport outcomes without a network, and
//! [`DataLayerHarness`] drives a runtime to quiescence while journaling
//! every processed action so tests can assert on the traffic.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::action::Action;
use crate::handler::HandlerTable;
use crate::http::HttpRequest;
use crate::runtime::{DataLayerRuntime, DispatchStore, Processed};
use crate::store::{Reducer, Store};
use crate::transport::{Transport, TransportError};

/// Transport double with scripted responses and a request log.
///
/// Responses are consumed in FIFO order, one per issued request. An
/// unscripted request fails with [`TransportError::Failed`], which keeps a
/// test honest about how many requests it expects.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful JSON response.
    pub fn push_response(&self, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(body));
    }

    /// Script a transport failure.
    pub fn push_failure(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Every request issued so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn issue(&self, request: &HttpRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Failed("no scripted response".into())))
    }
}

/// Test harness around [`DataLayerRuntime`] with a [`MockTransport`] and a
/// journal of every processed action.
///
/// # Example
/// ```ignore
/// let mut harness = DataLayerHarness::new(AppState::default(), reducer, table);
/// harness.transport().push_response(json!({ "like_count": 5 }));
/// harness.enqueue(LikesAction::Like { site_id: 1, post_id: 2 });
/// harness.settle().await;
/// assert_emitted!(harness, LikesAction::DidLike { .. });
/// ```
pub struct DataLayerHarness<S: 'static, A: Action, St: DispatchStore<S, A> = Store<S, A>> {
    runtime: DataLayerRuntime<S, A, St>,
    transport: Arc<MockTransport>,
    journal: Vec<Processed<A>>,
}

impl<S: 'static, A: Action> DataLayerHarness<S, A, Store<S, A>> {
    /// Create a harness from initial state, reducer, and handler table.
    pub fn new(state: S, reducer: Reducer<S, A>, table: Arc<HandlerTable<A>>) -> Self {
        Self::from_store(Store::new(state, reducer), table)
    }
}

impl<S: 'static, A: Action, St: DispatchStore<S, A>> DataLayerHarness<S, A, St> {
    /// Create a harness around an existing store.
    pub fn from_store(store: St, table: Arc<HandlerTable<A>>) -> Self {
        let transport = Arc::new(MockTransport::new());
        let runtime = DataLayerRuntime::from_store(store, table, transport.clone());
        Self {
            runtime,
            transport,
            journal: Vec::new(),
        }
    }

    /// The scripted transport.
    pub fn transport(&self) -> &MockTransport {
        &self.transport
    }

    /// Queue an action for normal dispatch.
    pub fn enqueue(&self, action: A) {
        self.runtime.enqueue(action);
    }

    /// Queue an action that skips data-layer interception.
    pub fn enqueue_bypassed(&self, action: A) {
        self.runtime.enqueue_bypassed(action);
    }

    /// Current state.
    pub fn state(&self) -> &S {
        self.runtime.state()
    }

    /// Every processed action so far, in processing order.
    pub fn journal(&self) -> &[Processed<A>] {
        &self.journal
    }

    /// Forget journaled actions, e.g. between test phases.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Process queued actions until the queue is empty and no request is in
    /// flight.
    ///
    /// Requests issued while settling are awaited too, so follow-up actions
    /// from completions land in the journal before this returns.
    pub async fn settle(&mut self) {
        loop {
            while let Some(processed) = self.runtime.try_process_next() {
                self.journal.push(processed);
            }
            if self.runtime.data_layer().pending_requests() == 0 {
                // One more drain catches completions that raced the check.
                match self.runtime.try_process_next() {
                    Some(processed) => self.journal.push(processed),
                    None => break,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    }
}

/// Assert that the harness journal contains an action matching the pattern.
#[macro_export]
macro_rules! assert_emitted {
    ($harness:expr, $pattern:pat) => {
        assert!(
            $harness
                .journal()
                .iter()
                .any(|processed| matches!(&processed.action, $pattern)),
            "no processed action matched `{}`; journal: {:?}",
            stringify!($pattern),
            $harness
                .journal()
                .iter()
                .map(|processed| &processed.action)
                .collect::<Vec<_>>()
        );
    };
}

/// Assert that no journaled action matches the pattern.
#[macro_export]
macro_rules! assert_not_emitted {
    ($harness:expr, $pattern:pat) => {
        assert!(
            !$harness
                .journal()
                .iter()
                .any(|processed| matches!(&processed.action, $pattern)),
            "a processed action matched `{}`; journal: {:?}",
            stringify!($pattern),
            $harness
                .journal()
                .iter()
                .map(|processed| &processed.action)
                .collect::<Vec<_>>()
        );
    };
}

/// Find the first journaled action matching the pattern, cloned.
#[macro_export]
macro_rules! find_emitted {
    ($harness:expr, $pattern:pat) => {
        $harness
            .journal()
            .iter()
            .find(|processed| matches!(&processed.action, $pattern))
            .map(|processed| processed.action.clone())
    };
}

/// Count journaled actions matching the pattern.
#[macro_export]
macro_rules! count_emitted {
    ($harness:expr, $pattern:pat) => {
        $harness
            .journal()
            .iter()
            .filter(|processed| matches!(&processed.action, $pattern))
            .count()
    };
}
