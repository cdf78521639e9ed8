//! Memoized dependency-tracked selectors
//!
//! A [`TreeSelector`] derives a value from a state tree and caches it
//! against the identity of its declared dependencies. Equality here is
//! reference identity ([`Arc::ptr_eq`]), never deep equality: a selector
//! recomputes exactly when a watched subtree was replaced, which is how
//! reducers built on clone-on-write `Arc` maps signal change.
//!
//! Parameterized selectors keep one cache entry per distinct argument
//! tuple, so one selector definition serves many lookups without the
//! lookups invalidating each other. The per-tuple cache is unbounded;
//! callers that feed unbounded argument spaces should [`clear`] it
//! periodically.
//!
//! Selector caches assume a single-threaded caller, matching the
//! event-loop model of the runtime. They are not `Sync`.
//!
//! [`clear`]: TreeSelector::clear

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use thiserror::Error;

/// Failure surfaced by [`TreeSelector::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The extractor found no dependencies; the referenced subtree is
    /// absent. Nothing was cached.
    #[error("selector dependency missing from state tree")]
    MissingDependency,
}

/// Dependency sets compared by reference identity.
///
/// Implemented for `Arc<T>` and for tuples of up to four dependency sets.
pub trait DependencyRefs {
    /// Whether every tracked reference is identical to its counterpart in
    /// `previous`.
    fn same_refs(&self, previous: &Self) -> bool;
}

impl<T: ?Sized> DependencyRefs for Arc<T> {
    fn same_refs(&self, previous: &Self) -> bool {
        Arc::ptr_eq(self, previous)
    }
}

macro_rules! impl_dependency_refs_for_tuple {
    ($($dep:ident : $idx:tt),+) => {
        impl<$($dep: DependencyRefs),+> DependencyRefs for ($($dep,)+) {
            fn same_refs(&self, previous: &Self) -> bool {
                $(self.$idx.same_refs(&previous.$idx))&&+
            }
        }
    };
}

impl_dependency_refs_for_tuple!(D0: 0);
impl_dependency_refs_for_tuple!(D0: 0, D1: 1);
impl_dependency_refs_for_tuple!(D0: 0, D1: 1, D2: 2);
impl_dependency_refs_for_tuple!(D0: 0, D1: 1, D2: 2, D3: 3);

/// A memoized selector over a state tree.
///
/// # Type parameters
/// * `S` - the state tree
/// * `D` - the extracted dependency set (implements [`DependencyRefs`])
/// * `Args` - call-time arguments keying the cache; use `()` when the
///   selector takes none
/// * `R` - the computed result
///
/// # Example
/// ```ignore
/// let by_id = TreeSelector::new(
///     |state: &AppState| Some((Arc::clone(&state.items),)),
///     |(items,), &id: &u64| items.get(&id).cloned(),
/// );
/// let item = by_id.select(&state, 42)?;
/// ```
pub struct TreeSelector<S, D, Args, R> {
    extract: Box<dyn Fn(&S) -> Option<D>>,
    compute: Box<dyn Fn(&D, &Args) -> R>,
    cache: RefCell<HashMap<Args, (D, R)>>,
}

impl<S, D, Args, R> TreeSelector<S, D, Args, R>
where
    D: DependencyRefs,
    Args: Eq + Hash + Clone,
    R: Clone,
{
    /// Create a selector from a dependency extractor and a compute
    /// function.
    ///
    /// The extractor returns `None` when the subtree it watches is absent;
    /// [`select`](Self::select) surfaces that as an error instead of
    /// caching an undefined result.
    pub fn new(
        extract: impl Fn(&S) -> Option<D> + 'static,
        compute: impl Fn(&D, &Args) -> R + 'static,
    ) -> Self {
        Self {
            extract: Box::new(extract),
            compute: Box::new(compute),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Compute or recall the derived value for the given arguments.
    ///
    /// Recomputes only when a dependency reference changed since the last
    /// call with the same arguments.
    pub fn select(&self, state: &S, args: Args) -> Result<R, SelectorError> {
        let deps = (self.extract)(state).ok_or(SelectorError::MissingDependency)?;

        let mut cache = self.cache.borrow_mut();
        if let Some((cached_deps, cached_result)) = cache.get(&args) {
            if deps.same_refs(cached_deps) {
                return Ok(cached_result.clone());
            }
        }

        let result = (self.compute)(&deps, &args);
        cache.insert(args, (deps, result.clone()));
        Ok(result)
    }

    /// Drop every cache entry.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Number of cached argument tuples.
    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct State {
        items: Option<Arc<Vec<u64>>>,
    }

    fn counting_sum_selector(
        calls: Rc<Cell<usize>>,
    ) -> TreeSelector<State, (Arc<Vec<u64>>,), (), u64> {
        TreeSelector::new(
            |state: &State| state.items.as_ref().map(|items| (Arc::clone(items),)),
            move |(items,), _| {
                calls.set(calls.get() + 1);
                items.iter().sum()
            },
        )
    }

    #[test]
    fn test_compute_runs_once_while_reference_is_unchanged() {
        let calls = Rc::new(Cell::new(0));
        let selector = counting_sum_selector(calls.clone());
        let state = State {
            items: Some(Arc::new(vec![1, 2, 3])),
        };

        assert_eq!(selector.select(&state, ()), Ok(6));
        assert_eq!(selector.select(&state, ()), Ok(6));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_new_reference_triggers_recompute() {
        let calls = Rc::new(Cell::new(0));
        let selector = counting_sum_selector(calls.clone());

        let state = State {
            items: Some(Arc::new(vec![1, 2, 3])),
        };
        assert_eq!(selector.select(&state, ()), Ok(6));

        // Same contents, different allocation: identity changed.
        let state = State {
            items: Some(Arc::new(vec![1, 2, 3])),
        };
        assert_eq!(selector.select(&state, ()), Ok(6));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_missing_subtree_is_surfaced_not_cached() {
        let calls = Rc::new(Cell::new(0));
        let selector = counting_sum_selector(calls.clone());

        let state = State { items: None };
        assert_eq!(
            selector.select(&state, ()),
            Err(SelectorError::MissingDependency)
        );
        assert_eq!(selector.cache_len(), 0);
        assert_eq!(calls.get(), 0);

        let state = State {
            items: Some(Arc::new(vec![4])),
        };
        assert_eq!(selector.select(&state, ()), Ok(4));
    }

    #[test]
    fn test_argument_tuples_have_independent_cache_entries() {
        let calls = Rc::new(Cell::new(0));
        let calls_in_compute = calls.clone();
        let selector: TreeSelector<State, (Arc<Vec<u64>>,), (u64, u64), u64> = TreeSelector::new(
            |state: &State| state.items.as_ref().map(|items| (Arc::clone(items),)),
            move |(items,), &(a, b)| {
                calls_in_compute.set(calls_in_compute.get() + 1);
                items.iter().sum::<u64>() + a + b
            },
        );

        let shared = Arc::new(vec![10]);
        let state = State {
            items: Some(Arc::clone(&shared)),
        };

        assert_eq!(selector.select(&state, (1, 2)), Ok(13));
        assert_eq!(selector.select(&state, (3, 4)), Ok(17));
        assert_eq!(calls.get(), 2);
        assert_eq!(selector.cache_len(), 2);

        // Both entries are warm; nothing recomputes.
        assert_eq!(selector.select(&state, (1, 2)), Ok(13));
        assert_eq!(selector.select(&state, (3, 4)), Ok(17));
        assert_eq!(calls.get(), 2);

        // Replacing the subtree invalidates each tuple independently, on
        // its next read.
        let state = State {
            items: Some(Arc::new(vec![20])),
        };
        assert_eq!(selector.select(&state, (1, 2)), Ok(23));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_tuple_dependencies_all_must_match() {
        #[derive(Clone)]
        struct Pair {
            left: Arc<u64>,
            right: Arc<u64>,
        }

        let calls = Rc::new(Cell::new(0));
        let calls_in_compute = calls.clone();
        let selector: TreeSelector<Pair, (Arc<u64>, Arc<u64>), (), u64> = TreeSelector::new(
            |pair: &Pair| Some((Arc::clone(&pair.left), Arc::clone(&pair.right))),
            move |(left, right), _| {
                calls_in_compute.set(calls_in_compute.get() + 1);
                **left + **right
            },
        );

        let mut pair = Pair {
            left: Arc::new(1),
            right: Arc::new(2),
        };
        assert_eq!(selector.select(&pair, ()), Ok(3));
        assert_eq!(selector.select(&pair, ()), Ok(3));
        assert_eq!(calls.get(), 1);

        pair.right = Arc::new(5);
        assert_eq!(selector.select(&pair, ()), Ok(6));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_clear_drops_entries() {
        let calls = Rc::new(Cell::new(0));
        let selector = counting_sum_selector(calls.clone());
        let state = State {
            items: Some(Arc::new(vec![1])),
        };

        selector.select(&state, ()).unwrap();
        assert_eq!(selector.cache_len(), 1);

        selector.clear();
        assert_eq!(selector.cache_len(), 0);

        selector.select(&state, ()).unwrap();
        assert_eq!(calls.get(), 2);
    }
}
