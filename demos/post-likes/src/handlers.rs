//! Data-layer handlers for the likes endpoints
//!
//! Each endpoint gets its own partial table; [`likes_handlers`] composes
//! them into the one table the runtime uses. A failed like is compensated
//! with a bypassed unlike (and vice versa) so the optimistic state reverts
//! without re-entering the data layer.

use net_dispatch::prelude::*;
use serde_json::{json, Value};

use crate::action::{LikesAction, LikesActionKind};
use crate::state::Liker;

/// Composed handler table for every likes endpoint.
pub fn likes_handlers() -> HandlerTable<LikesAction> {
    new_like_handlers()
        .merge(unlike_handlers())
        .merge(likes_request_handlers())
}

/// POST /sites/{site}/posts/{post}/likes/new
///
/// Empty JSON body; the response's `like_count` is the confirmed total. On
/// failure the inverse intent is dispatched with the bypass marker so the
/// optimistic bump reverts.
pub fn new_like_handlers() -> HandlerTable<LikesAction> {
    HandlerTable::new().with(
        LikesActionKind::Like,
        RequestHandler::fetching(|action: &LikesAction| {
            HttpRequest::post(format!(
                "/sites/{}/posts/{}/likes/new",
                action.site_id(),
                action.post_id()
            ))
            .with_body(json!({}))
        })
        .from_api(like_count_from_api)
        .on_success(|action, like_count| {
            vec![Outgoing::of(LikesAction::UpdateLikeCount {
                site_id: action.site_id(),
                post_id: action.post_id(),
                like_count,
            })]
        })
        .on_error(|action, _| {
            vec![Outgoing::bypassing(LikesAction::Unlike {
                site_id: action.site_id(),
                post_id: action.post_id(),
            })]
        })
        .build(),
    )
}

/// POST /sites/{site}/posts/{post}/likes/mine/delete
///
/// Symmetric to [`new_like_handlers`]: failure re-dispatches a bypassed
/// like.
pub fn unlike_handlers() -> HandlerTable<LikesAction> {
    HandlerTable::new().with(
        LikesActionKind::Unlike,
        RequestHandler::fetching(|action: &LikesAction| {
            HttpRequest::post(format!(
                "/sites/{}/posts/{}/likes/mine/delete",
                action.site_id(),
                action.post_id()
            ))
            .with_body(json!({}))
        })
        .from_api(like_count_from_api)
        .on_success(|action, like_count| {
            vec![Outgoing::of(LikesAction::UpdateLikeCount {
                site_id: action.site_id(),
                post_id: action.post_id(),
                like_count,
            })]
        })
        .on_error(|action, _| {
            vec![Outgoing::bypassing(LikesAction::Like {
                site_id: action.site_id(),
                post_id: action.post_id(),
            })]
        })
        .build(),
    )
}

/// GET /sites/{site}/posts/{post}/likes
///
/// Response shape `{ likes: [...], found }`.
pub fn likes_request_handlers() -> HandlerTable<LikesAction> {
    HandlerTable::new().with(
        LikesActionKind::LikesRequest,
        RequestHandler::fetching(|action: &LikesAction| {
            HttpRequest::get(format!(
                "/sites/{}/posts/{}/likes",
                action.site_id(),
                action.post_id()
            ))
        })
        .from_api(likers_from_api)
        .on_success(|action, (likers, found)| {
            vec![Outgoing::of(LikesAction::LikesDidLoad {
                site_id: action.site_id(),
                post_id: action.post_id(),
                likers,
                found,
            })]
        })
        .on_error(|action, error| {
            vec![Outgoing::bypassing(LikesAction::LikesDidError {
                site_id: action.site_id(),
                post_id: action.post_id(),
                message: error.to_string(),
            })]
        })
        .build(),
    )
}

/// Normalize a like/unlike response to its confirmed count.
fn like_count_from_api(raw: Value) -> Result<u64, ResponseShapeError> {
    let count = raw
        .get("like_count")
        .ok_or_else(|| ResponseShapeError::missing_field("like_count"))?;
    coerce_count("like_count", count)
}

/// Normalize a likers-list response.
fn likers_from_api(raw: Value) -> Result<(Vec<Liker>, u64), ResponseShapeError> {
    let likers = raw
        .get("likes")
        .ok_or_else(|| ResponseShapeError::missing_field("likes"))?;
    let likers: Vec<Liker> = serde_json::from_value(likers.clone())
        .map_err(|e| ResponseShapeError::invalid_field("likes", e.to_string()))?;

    let found = raw
        .get("found")
        .ok_or_else(|| ResponseShapeError::missing_field("found"))?;
    let found = coerce_count("found", found)?;

    Ok((likers, found))
}

/// Coerce a count that arrives as a number or a numeric string.
///
/// Anything else is a shape error; a count must never come out as garbage.
fn coerce_count(field: &str, value: &Value) -> Result<u64, ResponseShapeError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ResponseShapeError::invalid_field(field, format!("{n} is not a count"))),
        Value::String(s) => s
            .parse::<u64>()
            .map_err(|_| ResponseShapeError::invalid_field(field, format!("{s:?} is not numeric"))),
        other => Err(ResponseShapeError::invalid_field(
            field,
            format!("unexpected type: {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use net_dispatch::TransportError;

    fn like(site_id: u64, post_id: u64) -> LikesAction {
        LikesAction::Like { site_id, post_id }
    }

    #[test]
    fn test_like_fetch_builds_the_new_like_request() {
        let table = new_like_handlers();
        let handlers = table.handlers_for(LikesActionKind::Like);
        assert_eq!(handlers.len(), 1);

        let request = handlers[0].fetch(&like(1, 5));
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "/sites/1/posts/5/likes/new");
        assert_eq!(request.body, Some(json!({})));
    }

    #[test]
    fn test_unlike_fetch_builds_the_delete_request() {
        let table = unlike_handlers();
        let handlers = table.handlers_for(LikesActionKind::Unlike);

        let request = handlers[0].fetch(&LikesAction::Unlike {
            site_id: 2,
            post_id: 9,
        });
        assert_eq!(request.path, "/sites/2/posts/9/likes/mine/delete");
    }

    #[test]
    fn test_count_coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_count("like_count", &json!(42)), Ok(42));
        assert_eq!(coerce_count("like_count", &json!("42")), Ok(42));
    }

    #[test]
    fn test_count_coercion_rejects_garbage() {
        assert!(coerce_count("like_count", &json!("forty-two")).is_err());
        assert!(coerce_count("like_count", &json!(-1)).is_err());
        assert!(coerce_count("like_count", &json!(null)).is_err());
        assert!(coerce_count("like_count", &json!(1.5)).is_err());
    }

    #[test]
    fn test_from_api_requires_like_count() {
        assert!(like_count_from_api(json!({ "success": true })).is_err());
        assert_eq!(
            like_count_from_api(json!({ "success": true, "like_count": "7" })),
            Ok(7)
        );
    }

    #[test]
    fn test_success_maps_to_update_like_count() {
        let table = new_like_handlers();
        let handler = &table.handlers_for(LikesActionKind::Like)[0];

        let follow_ups = handler.complete(&like(1, 5), Ok(json!({ "like_count": 42 })));
        assert_eq!(
            follow_ups,
            vec![Outgoing::of(LikesAction::UpdateLikeCount {
                site_id: 1,
                post_id: 5,
                like_count: 42,
            })]
        );
    }

    #[test]
    fn test_identical_responses_produce_identical_follow_ups() {
        let table = new_like_handlers();
        let handler = &table.handlers_for(LikesActionKind::Like)[0];

        let first = handler.complete(&like(1, 5), Ok(json!({ "like_count": "3" })));
        let second = handler.complete(&like(1, 5), Ok(json!({ "like_count": "3" })));
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_like_compensates_with_bypassed_unlike() {
        let table = new_like_handlers();
        let handler = &table.handlers_for(LikesActionKind::Like)[0];

        let follow_ups = handler.complete(
            &like(1, 5),
            Err(TransportError::Failed("timeout".into())),
        );

        assert_eq!(
            follow_ups,
            vec![Outgoing::bypassing(LikesAction::Unlike {
                site_id: 1,
                post_id: 5,
            })]
        );
    }

    #[test]
    fn test_malformed_success_payload_also_compensates() {
        let table = new_like_handlers();
        let handler = &table.handlers_for(LikesActionKind::Like)[0];

        let follow_ups = handler.complete(&like(1, 5), Ok(json!({ "like_count": "soon" })));
        assert_eq!(
            follow_ups,
            vec![Outgoing::bypassing(LikesAction::Unlike {
                site_id: 1,
                post_id: 5,
            })]
        );
    }

    #[test]
    fn test_composed_table_registers_each_endpoint_once() {
        let table = likes_handlers();
        assert!(table.is_registered(LikesActionKind::Like));
        assert!(table.is_registered(LikesActionKind::Unlike));
        assert!(table.is_registered(LikesActionKind::LikesRequest));
        assert!(!table.is_registered(LikesActionKind::UpdateLikeCount));
        assert_eq!(table.handlers_for(LikesActionKind::Like).len(), 1);
    }

    #[test]
    fn test_strict_merge_rejects_overlapping_registrations() {
        let result = new_like_handlers().try_merge(new_like_handlers());
        assert!(result.is_err());
    }

    #[test]
    fn test_likers_from_api_parses_the_list_shape() {
        let (likers, found) = likers_from_api(json!({
            "likes": [{ "ID": 9, "login": "sam" }],
            "found": "2",
        }))
        .unwrap();

        assert_eq!(found, 2);
        assert_eq!(
            likers,
            vec![Liker {
                id: 9,
                login: "sam".into(),
            }]
        );
    }
}
