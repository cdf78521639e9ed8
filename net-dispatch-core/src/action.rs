//! Action trait and the outgoing-action envelope

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for actions that flow through the dispatch pipeline
///
/// Actions represent intents and results. They should be:
/// - Clone: Actions may be logged, replayed, or handed to multiple handlers
/// - Debug: For debugging and logging
/// - Send + 'static: For async completion across tasks
///
/// Every action exposes a [`Kind`](Action::Kind): a companion enum with one
/// unit variant per action variant, used as the key in a
/// [`HandlerTable`](crate::HandlerTable). Keying the dispatch table by an
/// enum instead of a free-form string keeps handler registration exhaustive
/// and typo-proof.
///
/// Use `#[derive(Action)]` from `net-dispatch-macros` to generate the kind
/// enum and this impl.
pub trait Action: Clone + Debug + Send + 'static {
    /// Companion key type used to look up handlers in a dispatch table.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Get the dispatch key for this action.
    fn kind(&self) -> Self::Kind;

    /// Get the action name for logging and filtering.
    fn name(&self) -> &'static str;
}

/// An action travelling through the dispatch pipeline, together with its
/// bypass marker.
///
/// A bypassed action skips data-layer interception but still reaches the
/// reducer. Handlers use this for compensating actions: when a request
/// fails, the inverse intent is re-dispatched with the marker set so it
/// cannot trigger the same handler again and loop forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing<A> {
    /// The wrapped action.
    pub action: A,
    /// Whether the data layer should skip interception for this action.
    pub bypass: bool,
}

impl<A> Outgoing<A> {
    /// Wrap an action for normal dispatch (interception enabled).
    pub fn of(action: A) -> Self {
        Self {
            action,
            bypass: false,
        }
    }

    /// Wrap an action with the bypass marker set.
    pub fn bypassing(action: A) -> Self {
        Self {
            action,
            bypass: true,
        }
    }
}

impl<A> From<A> for Outgoing<A> {
    fn from(action: A) -> Self {
        Self::of(action)
    }
}

/// Mark an action so the data layer skips re-interception.
///
/// The canonical use is error compensation: a failed "like" produces a
/// bypassed "unlike" that reverts the optimistic update without issuing
/// another request.
pub fn bypass_data_layer<A>(action: A) -> Outgoing<A> {
    Outgoing::bypassing(action)
}
