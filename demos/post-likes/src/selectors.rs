//! Derived reads over the posts subtree
//!
//! Rebuilding the feed/post index on every lookup would be wasteful, so it
//! lives behind a [`TreeSelector`] keyed on the posts list reference. The
//! by-feed-and-id lookup layers a second selector on top: its dependency is
//! the memoized index itself, so it only recomputes when the index was
//! rebuilt.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use net_dispatch::prelude::*;

use crate::state::{AppState, Post};

/// Index of posts keyed by (feed id, post id).
pub type PostMap = Arc<HashMap<(u64, u64), Arc<Post>>>;

/// Look up a post by its global id. Cheap enough to skip memoization.
pub fn get_post(state: &AppState, global_id: &str) -> Option<Arc<Post>> {
    state
        .posts
        .as_ref()?
        .iter()
        .find(|post| post.global_id == global_id)
        .cloned()
}

/// Memoized post lookups. One instance per reader; not `Sync`.
pub struct PostSelectors {
    post_map: Rc<PostMapSelector>,
    by_feed_and_id: TreeSelector<AppState, (PostMap,), (u64, u64), Option<Arc<Post>>>,
}

type PostMapSelector = TreeSelector<AppState, (Arc<Vec<Arc<Post>>>,), (), PostMap>;

impl PostSelectors {
    pub fn new() -> Self {
        let post_map: Rc<PostMapSelector> = Rc::new(TreeSelector::new(
            |state: &AppState| state.posts.as_ref().map(|posts| (Arc::clone(posts),)),
            |(posts,), _| {
                Arc::new(
                    posts
                        .iter()
                        .map(|post| ((post.feed_id, post.id), Arc::clone(post)))
                        .collect(),
                )
            },
        ));

        let post_map_dep = Rc::clone(&post_map);
        let by_feed_and_id = TreeSelector::new(
            move |state: &AppState| post_map_dep.select(state, ()).ok().map(|map| (map,)),
            |(map,), &(feed_id, post_id)| map.get(&(feed_id, post_id)).cloned(),
        );

        Self {
            post_map,
            by_feed_and_id,
        }
    }

    /// The memoized (feed id, post id) index.
    pub fn post_map(&self, state: &AppState) -> Result<PostMap, SelectorError> {
        self.post_map.select(state, ())
    }

    /// Look up a post by feed id and post id.
    pub fn post_by_feed_and_id(
        &self,
        state: &AppState,
        feed_id: u64,
        post_id: u64,
    ) -> Result<Option<Arc<Post>>, SelectorError> {
        self.by_feed_and_id.select(state, (feed_id, post_id))
    }
}

impl Default for PostSelectors {
    fn default() -> Self {
        Self::new()
    }
}
