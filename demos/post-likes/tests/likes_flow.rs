//! End-to-end likes flow against a mock HTTP server

use std::sync::Arc;

use net_dispatch::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use post_likes::{likes_handlers, reducer, AppState, LikesAction};

fn runtime_against(server: &MockServer) -> DataLayerRuntime<AppState, LikesAction> {
    let table = Arc::new(likes_handlers());
    let transport = Arc::new(HttpTransport::new(server.uri()));
    DataLayerRuntime::new(AppState::default(), reducer, table, transport)
}

/// Process actions until one matching the predicate has been folded in.
async fn process_until(
    runtime: &mut DataLayerRuntime<AppState, LikesAction>,
    mut predicate: impl FnMut(&LikesAction) -> bool,
) {
    loop {
        let processed = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            runtime.process_next(),
        )
        .await
        .expect("timed out waiting for an action")
        .expect("action channel closed");

        if predicate(&processed.action) {
            return;
        }
    }
}

#[tokio::test]
async fn test_successful_like_confirms_the_server_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/1/posts/5/likes/new"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "like_count": "42",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut runtime = runtime_against(&server);
    runtime.enqueue(LikesAction::Like {
        site_id: 1,
        post_id: 5,
    });

    process_until(&mut runtime, |action| {
        matches!(action, LikesAction::UpdateLikeCount { .. })
    })
    .await;

    let likes = runtime.state().likes_for(1, 5).unwrap();
    assert!(likes.i_like);
    assert_eq!(likes.like_count, 42);
}

#[tokio::test]
async fn test_failed_like_reverts_the_optimistic_bump() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/1/posts/5/likes/new"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut runtime = runtime_against(&server);
    runtime.enqueue(LikesAction::Like {
        site_id: 1,
        post_id: 5,
    });

    // The optimistic bump lands first.
    process_until(&mut runtime, |action| {
        matches!(action, LikesAction::Like { .. })
    })
    .await;
    assert!(runtime.state().likes_for(1, 5).unwrap().i_like);

    // The compensation arrives bypassed and reverts it. One request total:
    // the compensating unlike must not re-enter the data layer.
    process_until(&mut runtime, |action| {
        matches!(action, LikesAction::Unlike { .. })
    })
    .await;

    let likes = runtime.state().likes_for(1, 5).unwrap();
    assert!(!likes.i_like);
    assert_eq!(likes.like_count, 0);
    assert_eq!(runtime.data_layer().pending_requests(), 0);
}

#[tokio::test]
async fn test_unlike_hits_the_delete_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/1/posts/5/likes/mine/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "like_count": 3,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut runtime = runtime_against(&server);

    // Seed a liked post without touching the network.
    runtime.enqueue_bypassed(LikesAction::Like {
        site_id: 1,
        post_id: 5,
    });
    runtime.enqueue(LikesAction::Unlike {
        site_id: 1,
        post_id: 5,
    });

    process_until(&mut runtime, |action| {
        matches!(action, LikesAction::UpdateLikeCount { .. })
    })
    .await;

    let likes = runtime.state().likes_for(1, 5).unwrap();
    assert!(!likes.i_like);
    assert_eq!(likes.like_count, 3);
}

#[tokio::test]
async fn test_likers_list_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites/1/posts/5/likes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "likes": [
                { "ID": 9, "login": "sam" },
                { "ID": 12, "login": "jo" },
            ],
            "found": 2,
        })))
        .mount(&server)
        .await;

    let mut runtime = runtime_against(&server);
    runtime.enqueue(LikesAction::LikesRequest {
        site_id: 1,
        post_id: 5,
    });

    process_until(&mut runtime, |action| {
        matches!(action, LikesAction::LikesDidLoad { .. })
    })
    .await;

    let likes = runtime.state().likes_for(1, 5).unwrap();
    assert_eq!(likes.like_count, 2);
    assert_eq!(likes.likers.len(), 2);
    assert_eq!(likes.likers[0].login, "sam");
}

#[tokio::test]
async fn test_malformed_count_compensates_instead_of_corrupting_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/1/posts/5/likes/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "like_count": "not-a-number",
        })))
        .mount(&server)
        .await;

    let mut runtime = runtime_against(&server);
    runtime.enqueue(LikesAction::Like {
        site_id: 1,
        post_id: 5,
    });

    process_until(&mut runtime, |action| {
        matches!(action, LikesAction::Unlike { .. })
    })
    .await;

    let likes = runtime.state().likes_for(1, 5).unwrap();
    assert!(!likes.i_like);
    assert_eq!(likes.like_count, 0);
}
