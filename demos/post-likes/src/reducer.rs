//! Reducer for the post-likes state
//!
//! Intent actions apply optimistically: a `Like` bumps the count before the
//! server confirms, and a failed request comes back as the inverse intent
//! (bypassed) which reverts it here. The likes map is replaced wholesale on
//! every change so selectors can track it by reference.

use std::sync::Arc;

use crate::action::LikesAction;
use crate::state::{AppState, PostLikes};

/// Fold an action into state. Returns `true` if the state changed.
pub fn reducer(state: &mut AppState, action: LikesAction) -> bool {
    match action {
        LikesAction::Like { site_id, post_id } => {
            with_post_likes(state, site_id, post_id, |likes| {
                if likes.i_like {
                    return false;
                }
                likes.i_like = true;
                likes.like_count += 1;
                true
            })
        }

        LikesAction::Unlike { site_id, post_id } => {
            with_post_likes(state, site_id, post_id, |likes| {
                if !likes.i_like {
                    return false;
                }
                likes.i_like = false;
                likes.like_count = likes.like_count.saturating_sub(1);
                true
            })
        }

        LikesAction::UpdateLikeCount {
            site_id,
            post_id,
            like_count,
        } => with_post_likes(state, site_id, post_id, |likes| {
            if likes.like_count == like_count {
                return false;
            }
            likes.like_count = like_count;
            true
        }),

        LikesAction::LikesRequest { .. } => false,

        LikesAction::LikesDidLoad {
            site_id,
            post_id,
            likers,
            found,
        } => with_post_likes(state, site_id, post_id, |likes| {
            likes.likers = likers;
            likes.like_count = found;
            true
        }),

        LikesAction::LikesDidError { message, .. } => {
            state.last_error = Some(message);
            true
        }
    }
}

/// Clone-on-write update of one post's like state.
fn with_post_likes(
    state: &mut AppState,
    site_id: u64,
    post_id: u64,
    update: impl FnOnce(&mut PostLikes) -> bool,
) -> bool {
    let mut likes = (*state.likes).clone();
    let changed = update(likes.entry((site_id, post_id)).or_default());
    if changed {
        state.likes = Arc::new(likes);
    }
    changed
}
