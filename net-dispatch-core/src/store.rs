//! State store with reducer pattern
//!
//! The store is the action bus's terminal consumer: every action that
//! survives the data layer lands here and is folded into state by a
//! reducer. Optimistic updates work because intent actions reach the
//! reducer whether or not the data layer also issued a request for them.

use std::marker::PhantomData;

use crate::action::Action;

/// A reducer folds an action into state.
///
/// Returns `true` if the state changed.
pub type Reducer<S, A> = fn(&mut S, A) -> bool;

/// Centralized state container.
///
/// # Example
/// ```ignore
/// fn reducer(state: &mut Counts, action: CountAction) -> bool {
///     match action {
///         CountAction::Bump { id } => {
///             *state.entry(id).or_default() += 1;
///             true
///         }
///     }
/// }
///
/// let mut store = Store::new(Counts::default(), reducer);
/// store.dispatch(CountAction::Bump { id: 1 });
/// ```
pub struct Store<S, A: Action> {
    state: S,
    reducer: Reducer<S, A>,
    _marker: PhantomData<A>,
}

impl<S, A: Action> Store<S, A> {
    /// Create a store with initial state and reducer.
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self {
            state,
            reducer,
            _marker: PhantomData,
        }
    }

    /// Fold an action into state. Returns `true` if the state changed.
    pub fn dispatch(&mut self, action: A) -> bool {
        (self.reducer)(&mut self.state, action)
    }

    /// Current state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable state access, for initialization. Prefer dispatching actions.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }
}

/// Hooks around each dispatch, for logging and other cross-cutting
/// concerns.
pub trait Middleware<A: Action> {
    /// Called before the reducer sees the action.
    fn before(&mut self, action: &A);

    /// Called after the reducer processed the action.
    fn after(&mut self, action: &A, state_changed: bool);
}

/// Middleware that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Middleware that logs dispatched actions through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Log before the reducer runs.
    pub log_before: bool,
    /// Log after the reducer runs, with the change indicator.
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Log after dispatch only.
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Log both before and after dispatch.
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before {
            tracing::debug!(action = %action.name(), kind = ?action.kind(), "dispatching");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        if self.log_after {
            tracing::debug!(
                action = %action.name(),
                kind = ?action.kind(),
                state_changed,
                "dispatched"
            );
        }
    }
}

/// Compose several middleware into one.
///
/// `before` hooks run in insertion order, `after` hooks in reverse.
pub struct ComposedMiddleware<A: Action> {
    middlewares: Vec<Box<dyn Middleware<A>>>,
}

impl<A: Action> std::fmt::Debug for ComposedMiddleware<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("count", &self.middlewares.len())
            .finish()
    }
}

impl<A: Action> Default for ComposedMiddleware<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> ComposedMiddleware<A> {
    /// Create an empty composition.
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Append a middleware.
    pub fn add<M: Middleware<A> + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }
}

impl<A: Action> Middleware<A> for ComposedMiddleware<A> {
    fn before(&mut self, action: &A) {
        for middleware in &mut self.middlewares {
            middleware.before(action);
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(action, state_changed);
        }
    }
}

/// A [`Store`] wrapped with middleware hooks.
pub struct StoreWithMiddleware<S, A: Action, M: Middleware<A>> {
    store: Store<S, A>,
    middleware: M,
}

impl<S, A: Action, M: Middleware<A>> StoreWithMiddleware<S, A, M> {
    /// Create a store with middleware.
    pub fn new(state: S, reducer: Reducer<S, A>, middleware: M) -> Self {
        Self {
            store: Store::new(state, reducer),
            middleware,
        }
    }

    /// Dispatch through middleware and reducer.
    pub fn dispatch(&mut self, action: A) -> bool {
        self.middleware.before(&action);
        let changed = self.store.dispatch(action.clone());
        self.middleware.after(&action, changed);
        changed
    }

    /// Current state.
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// Mutable state access.
    pub fn state_mut(&mut self) -> &mut S {
        self.store.state_mut()
    }

    /// The wrapped middleware.
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Mutable access to the wrapped middleware.
    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    type Counts = HashMap<u64, u64>;

    #[derive(Clone, Debug)]
    enum CountAction {
        Bump { id: u64 },
        Ignore,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum CountKind {
        Bump,
        Ignore,
    }

    impl Action for CountAction {
        type Kind = CountKind;

        fn kind(&self) -> CountKind {
            match self {
                CountAction::Bump { .. } => CountKind::Bump,
                CountAction::Ignore => CountKind::Ignore,
            }
        }

        fn name(&self) -> &'static str {
            match self {
                CountAction::Bump { .. } => "Bump",
                CountAction::Ignore => "Ignore",
            }
        }
    }

    fn count_reducer(state: &mut Counts, action: CountAction) -> bool {
        match action {
            CountAction::Bump { id } => {
                *state.entry(id).or_default() += 1;
                true
            }
            CountAction::Ignore => false,
        }
    }

    #[test]
    fn test_dispatch_folds_actions_into_state() {
        let mut store = Store::new(Counts::default(), count_reducer);

        assert!(store.dispatch(CountAction::Bump { id: 1 }));
        assert!(store.dispatch(CountAction::Bump { id: 1 }));
        assert!(!store.dispatch(CountAction::Ignore));

        assert_eq!(store.state().get(&1), Some(&2));
    }

    #[derive(Default)]
    struct CountingMiddleware {
        before_count: usize,
        after_count: usize,
        changed_count: usize,
    }

    impl<A: Action> Middleware<A> for CountingMiddleware {
        fn before(&mut self, _action: &A) {
            self.before_count += 1;
        }

        fn after(&mut self, _action: &A, state_changed: bool) {
            self.after_count += 1;
            if state_changed {
                self.changed_count += 1;
            }
        }
    }

    #[test]
    fn test_middleware_sees_every_dispatch() {
        let mut store = StoreWithMiddleware::new(
            Counts::default(),
            count_reducer,
            CountingMiddleware::default(),
        );

        store.dispatch(CountAction::Bump { id: 1 });
        store.dispatch(CountAction::Ignore);

        assert_eq!(store.middleware().before_count, 2);
        assert_eq!(store.middleware().after_count, 2);
        assert_eq!(store.middleware().changed_count, 1);
    }

    #[test]
    fn test_composed_middleware_runs_all() {
        let mut composed = ComposedMiddleware::new();
        composed.add(CountingMiddleware::default());
        composed.add(LoggingMiddleware::new());

        let mut store = StoreWithMiddleware::new(Counts::default(), count_reducer, composed);
        store.dispatch(CountAction::Bump { id: 3 });
        assert_eq!(store.state().get(&3), Some(&1));
    }
}
