//! # net-dispatch-core
//!
//! Core traits and runtime for action-driven HTTP dispatch.
//!
//! Apps describe their network effects declaratively: each action kind maps
//! to a [`RequestHandler`] that knows how to build the HTTP request, shape
//! the raw response, and translate success or failure back into follow-up
//! actions. The [`DataLayer`] intercepts dispatched actions against the
//! composed [`HandlerTable`], issues requests through a pluggable
//! [`Transport`], and feeds completions back through the same action
//! channel. Every action, intercepted or not, still reaches the reducer, so
//! optimistic updates come for free.
//!
//! Derived reads go through [`TreeSelector`], a memoized selector keyed by
//! reference identity of the state subtrees it depends on.
//!
//! ## Architecture
//!
//! ```text
//! enqueue(action)
//!       |
//!       v
//! +--------------+   registered kind    +-----------+
//! |  DataLayer   | -------------------> | Transport | --> HTTP
//! +--------------+                      +-----------+
//!       |                                     |
//!       | (always)                 completions map to
//!       v                          follow-up actions,
//! +--------------+                 re-entering the queue
//! |    Store     | <--------------------------+
//! +--------------+
//!       |
//!       v
//!  TreeSelector reads
//! ```

pub mod action;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod runtime;
pub mod selector;
pub mod store;
pub mod testing;
pub mod transport;

pub use action::{bypass_data_layer, Action, Outgoing};
pub use dispatch::{DataLayer, Interception};
pub use handler::{
    DataLayerError, DuplicateKindError, HandlerTable, RequestHandler, RequestHandlerBuilder,
    ResponseShapeError,
};
pub use http::{HttpMethod, HttpRequest};
pub use runtime::{DataLayerRuntime, DispatchStore, Processed};
pub use selector::{DependencyRefs, SelectorError, TreeSelector};
pub use store::{
    ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Reducer, Store,
    StoreWithMiddleware,
};
pub use testing::{DataLayerHarness, MockTransport};
pub use transport::{HttpTransport, Transport, TransportError};

/// Common imports for apps built on net-dispatch.
pub mod prelude {
    pub use crate::action::{bypass_data_layer, Action, Outgoing};
    pub use crate::dispatch::{DataLayer, Interception};
    pub use crate::handler::{
        DataLayerError, HandlerTable, RequestHandler, ResponseShapeError,
    };
    pub use crate::http::{HttpMethod, HttpRequest};
    pub use crate::runtime::{DataLayerRuntime, Processed};
    pub use crate::selector::{SelectorError, TreeSelector};
    pub use crate::store::{Reducer, Store};
    pub use crate::transport::{HttpTransport, Transport, TransportError};
}
