//! Post-likes data layer built on net-dispatch
//!
//! The flow mirrors the classic optimistic-like pattern: dispatching
//! `Like` bumps the local count immediately while the data layer POSTs to
//! the likes endpoint; the confirmed count comes back as
//! `UpdateLikeCount`, and a failure comes back as a bypassed `Unlike` that
//! reverts the optimistic bump without re-entering the data layer.

pub mod action;
pub mod handlers;
pub mod reducer;
pub mod selectors;
pub mod state;

pub use action::{LikesAction, LikesActionKind};
pub use handlers::likes_handlers;
pub use reducer::reducer;
pub use selectors::{get_post, PostSelectors};
pub use state::{AppState, Liker, Post, PostLikes};
