//! net-dispatch: action-driven HTTP dispatch and memoized selectors
//!
//! Like the Redux data-layer pattern: apps dispatch plain actions, a
//! handler table maps registered action kinds to HTTP requests, and
//! completions come back as follow-up actions through the same channel.
//! Every action still reaches the reducer, so interception only adds side
//! effects and optimistic updates stay trivial.
//!
//! # Example
//! ```ignore
//! use net_dispatch::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum LikesAction {
//!     Like { site_id: u64, post_id: u64 },
//!     DidLike { site_id: u64, post_id: u64, like_count: u64 },
//! }
//!
//! let table = HandlerTable::new().with(
//!     LikesActionKind::Like,
//!     RequestHandler::fetching(|action: &LikesAction| { /* ... */ })
//!         .build(),
//! );
//! ```

// Re-export everything from core
pub use net_dispatch_core::*;

// Re-export derive macros
pub use net_dispatch_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    pub use net_dispatch_core::prelude::*;

    // Derive macros
    pub use net_dispatch_macros::Action;
}
