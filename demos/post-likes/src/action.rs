//! Actions for the post-likes flow
//!
//! Intent actions (`Like`, `Unlike`, `LikesRequest`) are what the UI
//! dispatches; result actions are produced by the data layer when requests
//! complete. Compensation actions arrive with the bypass marker set so they
//! do not re-enter the data layer.

use net_dispatch::prelude::*;
use net_dispatch::Action;

use crate::state::Liker;

#[derive(Action, Clone, Debug, PartialEq)]
pub enum LikesAction {
    /// User likes a post. Optimistic; the data layer confirms or reverts.
    Like { site_id: u64, post_id: u64 },

    /// User removes their like. Also optimistic.
    Unlike { site_id: u64, post_id: u64 },

    /// Server-confirmed like count for a post.
    UpdateLikeCount {
        site_id: u64,
        post_id: u64,
        like_count: u64,
    },

    /// Fetch the list of people who liked a post.
    LikesRequest { site_id: u64, post_id: u64 },

    /// The likers list arrived.
    LikesDidLoad {
        site_id: u64,
        post_id: u64,
        likers: Vec<Liker>,
        found: u64,
    },

    /// A likers fetch failed.
    LikesDidError {
        site_id: u64,
        post_id: u64,
        message: String,
    },
}

impl LikesAction {
    /// The site the action targets.
    pub fn site_id(&self) -> u64 {
        match self {
            LikesAction::Like { site_id, .. }
            | LikesAction::Unlike { site_id, .. }
            | LikesAction::UpdateLikeCount { site_id, .. }
            | LikesAction::LikesRequest { site_id, .. }
            | LikesAction::LikesDidLoad { site_id, .. }
            | LikesAction::LikesDidError { site_id, .. } => *site_id,
        }
    }

    /// The post the action targets.
    pub fn post_id(&self) -> u64 {
        match self {
            LikesAction::Like { post_id, .. }
            | LikesAction::Unlike { post_id, .. }
            | LikesAction::UpdateLikeCount { post_id, .. }
            | LikesAction::LikesRequest { post_id, .. }
            | LikesAction::LikesDidLoad { post_id, .. }
            | LikesAction::LikesDidError { post_id, .. } => *post_id,
        }
    }
}
