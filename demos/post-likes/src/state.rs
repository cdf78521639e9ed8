//! Application state for the post-likes demo
//!
//! Subtrees that selectors watch are `Arc`-backed and replaced wholesale by
//! the reducer (clone-on-write), so a changed subtree is observable as a
//! changed reference.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

/// Someone who liked a post.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Liker {
    #[serde(rename = "ID")]
    pub id: u64,
    pub login: String,
}

/// Like bookkeeping for one post.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostLikes {
    /// Whether the current user likes the post. Optimistic; reconciled by
    /// the data layer on failure.
    pub i_like: bool,
    /// Like count as last confirmed or optimistically adjusted.
    pub like_count: u64,
    /// People who liked the post, when fetched.
    pub likers: Vec<Liker>,
}

/// A post in the reader feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub global_id: String,
    pub feed_id: u64,
    pub id: u64,
    pub title: String,
}

/// Key for per-post like state: (site id, post id).
pub type LikeKey = (u64, u64);

/// Application state.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Like state per (site, post). Replaced wholesale on every change.
    pub likes: Arc<HashMap<LikeKey, PostLikes>>,

    /// Reader posts, `None` until the feed loads.
    pub posts: Option<Arc<Vec<Arc<Post>>>>,

    /// Message from the last failed likers fetch.
    pub last_error: Option<String>,
}

impl AppState {
    /// Like state for one post, if any action touched it yet.
    pub fn likes_for(&self, site_id: u64, post_id: u64) -> Option<&PostLikes> {
        self.likes.get(&(site_id, post_id))
    }
}
