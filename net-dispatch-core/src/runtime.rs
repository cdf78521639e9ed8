//! Runtime helpers for net-dispatch apps
//!
//! The runtime wires the action channel, the data layer, and a store into
//! one loop: dequeue an action, offer it to the data layer (which may issue
//! requests whose completions re-enter the same channel), then always fold
//! it into the store. Actions marked with the bypass flag skip the data
//! layer but still reach the reducer.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::{Action, Outgoing};
use crate::dispatch::{DataLayer, Interception};
use crate::handler::HandlerTable;
use crate::store::{Middleware, Reducer, Store, StoreWithMiddleware};
use crate::transport::Transport;

/// Store interface used by [`DataLayerRuntime`].
pub trait DispatchStore<S, A: Action> {
    /// Dispatch an action and return whether the state changed.
    fn dispatch(&mut self, action: A) -> bool;
    /// Get the current state.
    fn state(&self) -> &S;
}

impl<S, A: Action> DispatchStore<S, A> for Store<S, A> {
    fn dispatch(&mut self, action: A) -> bool {
        Store::dispatch(self, action)
    }

    fn state(&self) -> &S {
        Store::state(self)
    }
}

impl<S, A: Action, M: Middleware<A>> DispatchStore<S, A> for StoreWithMiddleware<S, A, M> {
    fn dispatch(&mut self, action: A) -> bool {
        StoreWithMiddleware::dispatch(self, action)
    }

    fn state(&self) -> &S {
        StoreWithMiddleware::state(self)
    }
}

/// Record of one action that went through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed<A> {
    /// The action, after the store consumed a copy.
    pub action: A,
    /// Whether the action carried the bypass marker.
    pub bypass: bool,
    /// What the data layer did with it.
    pub interception: Interception,
    /// Whether the reducer changed state.
    pub changed: bool,
}

/// Event loop tying the action channel, the data layer, and a store
/// together.
pub struct DataLayerRuntime<S, A: Action, St: DispatchStore<S, A> = Store<S, A>> {
    store: St,
    data_layer: DataLayer<A>,
    action_tx: mpsc::UnboundedSender<Outgoing<A>>,
    action_rx: mpsc::UnboundedReceiver<Outgoing<A>>,
    cancel: CancellationToken,
    _state: PhantomData<S>,
}

impl<S: 'static, A: Action> DataLayerRuntime<S, A, Store<S, A>> {
    /// Create a runtime from state, reducer, handler table, and transport.
    pub fn new(
        state: S,
        reducer: Reducer<S, A>,
        table: Arc<HandlerTable<A>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::from_store(Store::new(state, reducer), table, transport)
    }
}

impl<S: 'static, A: Action, St: DispatchStore<S, A>> DataLayerRuntime<S, A, St> {
    /// Create a runtime from an existing store.
    pub fn from_store(store: St, table: Arc<HandlerTable<A>>, transport: Arc<dyn Transport>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let data_layer = DataLayer::new(table, transport, action_tx.clone());
        Self {
            store,
            data_layer,
            action_tx,
            action_rx,
            cancel: CancellationToken::new(),
            _state: PhantomData,
        }
    }

    /// Queue an action for normal dispatch.
    pub fn enqueue(&self, action: A) {
        let _ = self.action_tx.send(Outgoing::of(action));
    }

    /// Queue an action that skips data-layer interception.
    pub fn enqueue_bypassed(&self, action: A) {
        let _ = self.action_tx.send(Outgoing::bypassing(action));
    }

    /// Clone the action sender, e.g. for external producers.
    pub fn action_tx(&self) -> mpsc::UnboundedSender<Outgoing<A>> {
        self.action_tx.clone()
    }

    /// Current state.
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// The data layer, e.g. for inspecting in-flight request counts.
    pub fn data_layer(&self) -> &DataLayer<A> {
        &self.data_layer
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn process(&mut self, outgoing: Outgoing<A>) -> Processed<A> {
        let interception = self.data_layer.intercept(&outgoing);
        let changed = self.store.dispatch(outgoing.action.clone());
        Processed {
            action: outgoing.action,
            bypass: outgoing.bypass,
            interception,
            changed,
        }
    }

    /// Dequeue and process one action, waiting if the queue is empty.
    ///
    /// Returns `None` once every sender is dropped.
    pub async fn process_next(&mut self) -> Option<Processed<A>> {
        let outgoing = self.action_rx.recv().await?;
        Some(self.process(outgoing))
    }

    /// Process one queued action without waiting.
    pub fn try_process_next(&mut self) -> Option<Processed<A>> {
        let outgoing = self.action_rx.try_recv().ok()?;
        Some(self.process(outgoing))
    }

    /// Run the loop until `should_stop` matches a dequeued action, the
    /// cancellation token fires, or the channel closes.
    ///
    /// The matching action is not processed.
    pub async fn run<F>(&mut self, mut should_stop: F)
    where
        F: FnMut(&A) -> bool,
    {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                maybe_outgoing = self.action_rx.recv() => {
                    match maybe_outgoing {
                        Some(outgoing) => {
                            if should_stop(&outgoing.action) {
                                break;
                            }
                            self.process(outgoing);
                        }
                        None => break,
                    }
                }
            }
        }
    }
}
