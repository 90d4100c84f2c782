/// HTTP tests for the post endpoints against the in-process store
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, ids, seed_post, send, setup_test_app};
use post_service::db::{InMemoryPostStore, PostStore};
use serde_json::json;
use std::sync::Arc;

fn store_with_users(users: &[i64]) -> Arc<InMemoryPostStore> {
    Arc::new(InMemoryPostStore::with_users(users.iter().copied()))
}

// ============================================
// Create
// ============================================

#[actix_web::test]
async fn created_post_is_listed_with_zero_metrics() {
    let store = store_with_users(&[1]);
    let app = setup_test_app(store.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(1))
        .set_json(json!({ "text": "hello", "tags": ["intro"] }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["text"], "hello");
    assert_eq!(body["post"]["authorIds"], json!([1]));
    assert_eq!(body["post"]["tags"], json!(["intro"]));

    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=1")
        .insert_header(bearer(1))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["text"], "hello");
    assert_eq!(posts[0]["likes"], 0);
    assert_eq!(posts[0]["reads"], 0);
    assert_eq!(posts[0]["popularity"], 0.0);
    assert!(posts[0].get("authorIds").is_none());
}

#[actix_web::test]
async fn create_without_text_is_rejected() {
    let app = setup_test_app(store_with_users(&[1])).await;

    for payload in [
        json!({}),
        json!({ "text": "" }),
        json!({ "text": null }),
        json!({ "tags": ["a"] }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(1))
            .set_json(payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Must provide text for the new post");
    }
}

#[actix_web::test]
async fn create_with_null_tags_has_no_tags() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(1))
        .set_json(json!({ "text": "hello", "tags": null }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["text"], "hello");
    assert_eq!(body["post"]["tags"], json!([]));
}

#[actix_web::test]
async fn create_with_wrong_field_type_names_the_fields() {
    let app = setup_test_app(store_with_users(&[1])).await;

    for payload in [json!({ "text": 5 }), json!({ "text": "x", "tags": [1] })] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(1))
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");

        let message = body["error"].as_str().unwrap();
        assert!(!message.contains("not valid JSON"), "{message}");
        assert!(message.contains("`text`") && message.contains("`tags`"), "{message}");
    }
}

#[actix_web::test]
async fn create_with_malformed_json_is_rejected() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(1))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"text\": ")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not valid JSON"));
}

// ============================================
// Authentication
// ============================================

#[actix_web::test]
async fn requests_without_token_are_unauthenticated() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let requests = [
        test::TestRequest::get().uri("/api/posts?authorIds=1"),
        test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "text": "x" })),
        test::TestRequest::patch()
            .uri("/api/posts/1")
            .set_json(json!({ "text": "x" })),
    ];

    for req in requests {
        let (status, body) = send(&app, req.to_request()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }
}

#[actix_web::test]
async fn token_for_unknown_user_is_unauthenticated() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=1")
        .insert_header(bearer(77))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn user_added_after_startup_can_post() {
    let store = store_with_users(&[1]);
    let app = setup_test_app(store.clone()).await;

    let create = || {
        test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(8))
            .set_json(json!({ "text": "late arrival" }))
            .to_request()
    };

    let (status, _) = send(&app, create()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    store.add_user(8).unwrap();

    let (status, body) = send(&app, create()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["authorIds"], json!([8]));
}

#[actix_web::test]
async fn authentication_is_checked_before_parameters() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let req = test::TestRequest::get()
        .uri("/api/posts?sortBy=nonsense")
        .insert_header(bearer(99))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================
// Fetch
// ============================================

#[actix_web::test]
async fn fetch_is_a_union_without_duplicates() {
    let store = store_with_users(&[1, 2, 3]);
    let shared = seed_post(&store, 1, "shared", 1, 1, 0.1).await;
    let by_two = seed_post(&store, 2, "by two", 1, 1, 0.1).await;
    seed_post(&store, 3, "by three", 1, 1, 0.1).await;

    let mut uow = store.begin().await.unwrap();
    uow.replace_authors(shared.id, &[1, 2]).await.unwrap();
    uow.commit().await.unwrap();

    let app = setup_test_app(store).await;
    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=1,2")
        .insert_header(bearer(3))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![shared.id, by_two.id]);
}

#[actix_web::test]
async fn fetch_sorts_with_ascending_id_tie_break() {
    let store = store_with_users(&[1]);
    let a = seed_post(&store, 1, "a", 5, 10, 0.5).await;
    let b = seed_post(&store, 1, "b", 9, 30, 0.5).await;
    let c = seed_post(&store, 1, "c", 5, 20, 0.9).await;
    let app = setup_test_app(store).await;

    let cases = [
        ("", vec![a.id, b.id, c.id]),
        ("&sortBy=likes", vec![a.id, c.id, b.id]),
        ("&sortBy=likes&direction=desc", vec![b.id, a.id, c.id]),
        ("&sortBy=reads&direction=desc", vec![b.id, c.id, a.id]),
        ("&sortBy=popularity&direction=desc", vec![c.id, a.id, b.id]),
        ("&direction=desc", vec![c.id, b.id, a.id]),
    ];

    for (extra, expected) in cases {
        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri(&format!("/api/posts?authorIds=1{extra}"))
                .insert_header(bearer(1))
                .to_request();
            let (status, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::OK, "query {extra}");
            assert_eq!(ids(&body), expected, "query {extra}");
        }
    }
}

#[actix_web::test]
async fn listing_keys_are_alphabetical() {
    let store = store_with_users(&[1]);
    seed_post(&store, 1, "keys", 1, 2, 0.3).await;
    let app = setup_test_app(store).await;

    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=1")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = test::read_body(resp).await;

    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"posts":[{"id":1,"likes":1,"popularity":0.3,"reads":2,"tags":[],"text":"keys"}]}"#
    );
}

#[actix_web::test]
async fn only_unknown_authors_gives_empty_result_with_warning() {
    let store = store_with_users(&[1]);
    seed_post(&store, 1, "mine", 0, 0, 0.0).await;
    let app = setup_test_app(store).await;

    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=40,41")
        .insert_header(bearer(1))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"], json!([]));
    assert!(body["warning"].as_str().unwrap().contains("None of the author id(s)"));
}

#[actix_web::test]
async fn known_author_without_posts_gives_empty_result() {
    let app = setup_test_app(store_with_users(&[1, 2])).await;

    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=2")
        .insert_header(bearer(1))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "posts": [] }));
}

#[actix_web::test]
async fn invalid_query_parameters_are_rejected() {
    let app = setup_test_app(store_with_users(&[1])).await;

    for uri in [
        "/api/posts",
        "/api/posts?authorIds=1,x",
        "/api/posts?authorIds=",
        "/api/posts?authorIds=1&sortBy=text",
        "/api/posts?authorIds=1&direction=up",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(1))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

// ============================================
// Update
// ============================================

#[actix_web::test]
async fn author_update_then_former_non_author_is_refused() {
    let store = store_with_users(&[1, 2, 3]);
    let post = seed_post(&store, 1, "draft", 0, 0, 0.0).await;
    let app = setup_test_app(store).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(1))
        .set_json(json!({ "authorIds": [1, 2] }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["authorIds"], json!([1, 2]));

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(3))
        .set_json(json!({ "text": "hijacked" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(2))
        .set_json(json!({ "text": "co-written" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["text"], "co-written");
}

#[actix_web::test]
async fn unknown_author_id_leaves_post_unchanged() {
    let store = store_with_users(&[1, 2]);
    let post = seed_post(&store, 1, "draft", 0, 0, 0.0).await;
    let app = setup_test_app(store.clone()).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(1))
        .set_json(json!({ "authorIds": [2, 5], "text": "should not land" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let stored = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.author_ids, vec![1]);
    assert_eq!(stored.text, "draft");
}

#[actix_web::test]
async fn tags_read_back_exactly() {
    let store = store_with_users(&[1]);
    let post = seed_post(&store, 1, "tagged", 0, 0, 0.0).await;
    let app = setup_test_app(store).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(1))
        .set_json(json!({ "tags": ["a", "b"] }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["tags"], json!(["a", "b"]));

    let req = test::TestRequest::get()
        .uri("/api/posts?authorIds=1")
        .insert_header(bearer(1))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["posts"][0]["tags"], json!(["a", "b"]));
}

#[actix_web::test]
async fn update_response_has_detail_key_order() {
    let store = store_with_users(&[1]);
    let post = seed_post(&store, 1, "ordered", 4, 8, 0.5).await;
    let app = setup_test_app(store).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(1))
        .set_json(json!({ "text": "reordered" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = test::read_body(resp).await;

    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        format!(
            r#"{{"post":{{"id":{},"authorIds":[1],"likes":4,"popularity":0.5,"reads":8,"tags":[],"text":"reordered"}}}}"#,
            post.id
        )
    );
}

#[actix_web::test]
async fn non_numeric_post_id_is_rejected() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let req = test::TestRequest::patch()
        .uri("/api/posts/one")
        .insert_header(bearer(1))
        .set_json(json!({ "text": "x" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("/api/posts/1"));
}

#[actix_web::test]
async fn missing_post_is_a_warning() {
    let app = setup_test_app(store_with_users(&[1])).await;

    let req = test::TestRequest::patch()
        .uri("/api/posts/999")
        .insert_header(bearer(1))
        .set_json(json!({ "text": "x" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "warning": "The post you requested does not exist in the database." })
    );
}

#[actix_web::test]
async fn invalid_payloads_are_rejected_without_writes() {
    let store = store_with_users(&[1]);
    let post = seed_post(&store, 1, "stable", 0, 0, 0.0).await;
    let app = setup_test_app(store.clone()).await;

    for payload in [
        json!({}),
        json!({ "authorIds": [] }),
        json!({ "authorIds": [1, "2"] }),
        json!({ "tags": ["ok", 3] }),
        json!({ "tags": ["ok"], "text": "" }),
        json!({ "text": 12 }),
    ] {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/posts/{}", post.id))
            .insert_header(bearer(1))
            .set_json(&payload)
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
    }

    let stored = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "stable");
    assert!(stored.tags.is_empty());
}

// ============================================
// Health
// ============================================

#[actix_web::test]
async fn health_needs_no_token() {
    let app = setup_test_app(store_with_users(&[])).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) =
        send(&app, test::TestRequest::get().uri("/api/health/live").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], true);
}
