//! Action-to-HTTP dispatch mapping
//!
//! The [`DataLayer`] intercepts actions whose kind is registered in its
//! [`HandlerTable`], issues the described requests through the
//! [`Transport`], and feeds every follow-up action back through the action
//! channel. Interception is synchronous; the network call is not.
//!
//! Per-action ordering is fixed: `fetch` runs before the network call, the
//! network call before `from_api`, and `from_api` before
//! `on_success`/`on_error`. No ordering holds between independent in-flight
//! actions, and an issued request cannot be cancelled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::action::{Action, Outgoing};
use crate::handler::HandlerTable;
use crate::transport::Transport;

/// What the data layer did with an offered action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// The action carried the bypass marker; nothing was issued.
    Bypassed,
    /// No handler is registered for the action's kind. A no-op, not a
    /// failure.
    Unregistered,
    /// Requests were issued, one per registered handler.
    Issued(usize),
}

/// Maps intercepted actions to HTTP requests and completions to follow-up
/// actions.
///
/// The handler table is read-only after construction and safe to share; all
/// outputs are delivered through the action channel handed in at
/// construction time.
pub struct DataLayer<A: Action> {
    table: Arc<HandlerTable<A>>,
    transport: Arc<dyn Transport>,
    action_tx: mpsc::UnboundedSender<Outgoing<A>>,
    pending: Arc<AtomicUsize>,
}

impl<A: Action> DataLayer<A> {
    /// Create a data layer over a composed handler table and a transport.
    pub fn new(
        table: Arc<HandlerTable<A>>,
        transport: Arc<dyn Transport>,
        action_tx: mpsc::UnboundedSender<Outgoing<A>>,
    ) -> Self {
        Self {
            table,
            transport,
            action_tx,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The composed handler table.
    pub fn table(&self) -> &HandlerTable<A> {
        &self.table
    }

    /// Number of requests issued but not yet completed.
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Offer an action to the data layer.
    ///
    /// For each handler registered under the action's kind, builds the
    /// request via `fetch` and spawns the transport call. Completions map
    /// through `from_api`/`on_success` or `on_error` and are sent back as
    /// new outgoing actions. Returns immediately; must be called from
    /// within a tokio runtime.
    pub fn intercept(&self, outgoing: &Outgoing<A>) -> Interception {
        if outgoing.bypass {
            tracing::trace!(action = %outgoing.action.name(), "bypassing data layer");
            return Interception::Bypassed;
        }

        let handlers = self.table.handlers_for(outgoing.action.kind());
        if handlers.is_empty() {
            return Interception::Unregistered;
        }

        for handler in handlers {
            let request = handler.fetch(&outgoing.action);
            tracing::debug!(
                action = %outgoing.action.name(),
                method = %request.method,
                path = %request.path,
                "issuing request"
            );

            let transport = Arc::clone(&self.transport);
            let handler = Arc::clone(handler);
            let action = outgoing.action.clone();
            let action_tx = self.action_tx.clone();
            let pending = Arc::clone(&self.pending);

            pending.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let result = transport.issue(&request).await;
                for follow_up in handler.complete(&action, result) {
                    // Receiver dropped means the loop is shutting down.
                    let _ = action_tx.send(follow_up);
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            });
        }

        Interception::Issued(handlers.len())
    }
}
