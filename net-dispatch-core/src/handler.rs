//! Request handlers and the handler table
//!
//! A [`RequestHandler`] bundles the four facets registered for one action
//! kind: `fetch` builds the outbound request, `from_api` normalizes the raw
//! response, `on_success` maps the normalized response to follow-up actions,
//! and `on_error` produces compensating actions on failure.
//!
//! A [`HandlerTable`] composes independently authored handler maps into one
//! immutable dispatch table, keyed by [`Action::Kind`].
//!
//! # Example
//!
//! ```ignore
//! let table = HandlerTable::new().with(
//!     MyActionKind::Fetch,
//!     RequestHandler::fetching(|action: &MyAction| {
//!         HttpRequest::get(format!("/items/{}", action.id()))
//!     })
//!     .from_api(parse_item)
//!     .on_success(|action, item| vec![Outgoing::of(MyAction::DidLoad(item))])
//!     .on_error(|action, _| vec![Outgoing::of(MyAction::DidError(action.id()))])
//!     .build(),
//! );
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::action::{Action, Outgoing};
use crate::http::HttpRequest;
use crate::transport::TransportError;

/// A successful transport response whose body does not match the expected
/// shape.
///
/// Raised by `from_api` normalizers. A shape error is a failure: it routes
/// to `on_error` and never produces a success action carrying corrupted
/// data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response shape mismatch: {reason}")]
pub struct ResponseShapeError {
    reason: String,
}

impl ResponseShapeError {
    /// Create a shape error with a free-form reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The response lacks a required field.
    pub fn missing_field(field: &str) -> Self {
        Self::new(format!("missing field `{field}`"))
    }

    /// A field is present but holds an unusable value.
    pub fn invalid_field(field: &str, detail: impl fmt::Display) -> Self {
        Self::new(format!("invalid value for `{field}`: {detail}"))
    }

    /// Human-readable description of the mismatch.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// The failure handed to `on_error`: either the transport failed or the
/// success payload was malformed.
#[derive(Debug, Error)]
pub enum DataLayerError {
    /// Network-level failure (connection, timeout, non-success status).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Transport succeeded but the payload failed shape validation.
    #[error(transparent)]
    Shape(#[from] ResponseShapeError),
}

/// Registering two tables that both claim an action kind via
/// [`HandlerTable::try_merge`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler table already registers action kind {kind:?}")]
pub struct DuplicateKindError<K: fmt::Debug> {
    /// The conflicting kind.
    pub kind: K,
}

type FetchFn<A> = Box<dyn Fn(&A) -> HttpRequest + Send + Sync>;
type CompleteOkFn<A> =
    Box<dyn Fn(&A, Value) -> Result<Vec<Outgoing<A>>, ResponseShapeError> + Send + Sync>;
type CompleteErrFn<A> = Box<dyn Fn(&A, &DataLayerError) -> Vec<Outgoing<A>> + Send + Sync>;

/// The fetch/normalize/success/error bundle registered for one action kind.
///
/// Built through [`RequestHandler::fetching`]. The handler itself never
/// performs I/O: the data layer calls [`fetch`](Self::fetch) to obtain a
/// request descriptor and [`complete`](Self::complete) once the transport
/// reports a terminal outcome.
pub struct RequestHandler<A: Action> {
    fetch: FetchFn<A>,
    on_ok: CompleteOkFn<A>,
    on_err: CompleteErrFn<A>,
}

impl<A: Action> RequestHandler<A> {
    /// Start building a handler from its required facet: the request
    /// constructor.
    pub fn fetching(
        fetch: impl Fn(&A) -> HttpRequest + Send + Sync + 'static,
    ) -> RequestHandlerBuilder<A, Value> {
        RequestHandlerBuilder {
            fetch: Box::new(fetch),
            from_api: Box::new(|raw| Ok(raw)),
            on_success: Box::new(|_, _| Vec::new()),
            on_error: Box::new(|_, _| Vec::new()),
        }
    }

    /// Build the outbound request for the triggering action.
    pub fn fetch(&self, action: &A) -> HttpRequest {
        (self.fetch)(action)
    }

    /// Map a terminal transport outcome to follow-up actions.
    ///
    /// On success the raw response is normalized first; a normalization
    /// failure is routed to the error facet like a transport failure.
    pub fn complete(&self, action: &A, result: Result<Value, TransportError>) -> Vec<Outgoing<A>> {
        match result {
            Ok(raw) => match (self.on_ok)(action, raw) {
                Ok(follow_ups) => follow_ups,
                Err(shape) => {
                    tracing::warn!(
                        action = %action.name(),
                        error = %shape,
                        "response failed shape validation"
                    );
                    (self.on_err)(action, &DataLayerError::Shape(shape))
                }
            },
            Err(transport) => {
                tracing::debug!(
                    action = %action.name(),
                    error = %transport,
                    "request failed"
                );
                (self.on_err)(action, &DataLayerError::Transport(transport))
            }
        }
    }
}

impl<A: Action> fmt::Debug for RequestHandler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler").finish_non_exhaustive()
    }
}

/// Builder for [`RequestHandler`].
///
/// `N` is the normalized response type produced by `from_api`. Setting
/// `from_api` changes `N` and therefore resets any previously set
/// `on_success`; set the facets in registration order: `from_api`, then
/// `on_success`, then `on_error`.
pub struct RequestHandlerBuilder<A: Action, N> {
    fetch: FetchFn<A>,
    from_api: Box<dyn Fn(Value) -> Result<N, ResponseShapeError> + Send + Sync>,
    on_success: Box<dyn Fn(&A, N) -> Vec<Outgoing<A>> + Send + Sync>,
    on_error: CompleteErrFn<A>,
}

impl<A: Action, N: 'static> RequestHandlerBuilder<A, N> {
    /// Set the pure response normalizer.
    ///
    /// Runs only on transport success, before `on_success`. Returning an
    /// error fails the request instead of producing a success action.
    pub fn from_api<M: 'static>(
        self,
        from_api: impl Fn(Value) -> Result<M, ResponseShapeError> + Send + Sync + 'static,
    ) -> RequestHandlerBuilder<A, M> {
        RequestHandlerBuilder {
            fetch: self.fetch,
            from_api: Box::new(from_api),
            on_success: Box::new(|_, _| Vec::new()),
            on_error: self.on_error,
        }
    }

    /// Set the follow-up action producer for successful responses.
    pub fn on_success(
        mut self,
        on_success: impl Fn(&A, N) -> Vec<Outgoing<A>> + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Box::new(on_success);
        self
    }

    /// Set the compensating action producer for failures.
    pub fn on_error(
        mut self,
        on_error: impl Fn(&A, &DataLayerError) -> Vec<Outgoing<A>> + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Box::new(on_error);
        self
    }

    /// Finish the handler.
    pub fn build(self) -> RequestHandler<A> {
        let from_api = self.from_api;
        let on_success = self.on_success;
        RequestHandler {
            fetch: self.fetch,
            on_ok: Box::new(move |action, raw| {
                from_api(raw).map(|normalized| on_success(action, normalized))
            }),
            on_err: self.on_error,
        }
    }
}

/// Immutable dispatch table mapping action kinds to ordered handler lists.
///
/// Built once at startup by composing partial tables with [`merge`] or
/// [`try_merge`], then shared read-only (typically behind an `Arc`).
///
/// [`merge`]: HandlerTable::merge
/// [`try_merge`]: HandlerTable::try_merge
pub struct HandlerTable<A: Action> {
    entries: HashMap<A::Kind, Vec<Arc<RequestHandler<A>>>>,
}

impl<A: Action> Default for HandlerTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> HandlerTable<A> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Append a handler for the given kind, preserving registration order.
    pub fn register(&mut self, kind: A::Kind, handler: RequestHandler<A>) {
        self.entries.entry(kind).or_default().push(Arc::new(handler));
    }

    /// Chainable [`register`](Self::register).
    pub fn with(mut self, kind: A::Kind, handler: RequestHandler<A>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Compose two tables, concatenating handler lists where both register
    /// the same kind. Both chains run, in the order supplied.
    pub fn merge(mut self, other: Self) -> Self {
        for (kind, handlers) in other.entries {
            self.entries.entry(kind).or_default().extend(handlers);
        }
        self
    }

    /// Compose two tables, failing fast if both register the same kind.
    ///
    /// Use this where overlapping registrations indicate a wiring mistake
    /// rather than intentional handler chaining.
    pub fn try_merge(mut self, other: Self) -> Result<Self, DuplicateKindError<A::Kind>> {
        for (kind, handlers) in other.entries {
            if self.entries.contains_key(&kind) {
                return Err(DuplicateKindError { kind });
            }
            self.entries.insert(kind, handlers);
        }
        Ok(self)
    }

    /// Get the handlers registered for a kind, in registration order.
    /// Returns an empty slice for unregistered kinds.
    pub fn handlers_for(&self, kind: A::Kind) -> &[Arc<RequestHandler<A>>] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any handler is registered for the kind.
    pub fn is_registered(&self, kind: A::Kind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no registrations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the registered kinds.
    pub fn kinds(&self) -> impl Iterator<Item = &A::Kind> {
        self.entries.keys()
    }
}

impl<A: Action> fmt::Debug for HandlerTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("kinds", &self.entries.len())
            .finish()
    }
}
