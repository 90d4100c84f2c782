//! Shared helpers for HTTP-level tests.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use crypto_core::{jwt, testing::init_test_keys};
use post_service::db::{InMemoryPostStore, PostStore};
use post_service::handlers;
use post_service::middleware::JwtAuthMiddleware;
use post_service::models::{NewPost, Post};
use post_service::services::PostService;
use serde_json::Value;
use std::sync::Arc;

/// Routes exactly as `main` mounts them, minus CORS and request logging.
pub async fn setup_test_app(
    store: Arc<InMemoryPostStore>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    init_test_keys();
    let service = web::Data::new(PostService::new(store));

    test::init_service(
        App::new()
            .app_data(service)
            .service(web::scope("/api/health").configure(handlers::health::configure))
            .service(
                web::scope("/api")
                    .wrap(JwtAuthMiddleware)
                    .configure(handlers::configure),
            ),
    )
    .await
}

pub fn bearer(user_id: i64) -> (&'static str, String) {
    init_test_keys();
    let token = jwt::generate_access_token(user_id, "tester").expect("sign test token");
    ("Authorization", format!("Bearer {token}"))
}

/// Insert a post directly through the store, bypassing HTTP.
pub async fn seed_post(
    store: &InMemoryPostStore,
    author_id: i64,
    text: &str,
    likes: i64,
    reads: i64,
    popularity: f64,
) -> Post {
    store
        .create_post(
            author_id,
            &NewPost::new(text, vec![]).with_metrics(likes, reads, popularity),
        )
        .await
        .expect("seed post")
}

/// Send a request and decode the JSON body. Errors raised by middleware are
/// rendered the same way the server would render them.
pub async fn send<S, B>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, bytes) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let bytes = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, bytes)
        }
    };

    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn ids(body: &Value) -> Vec<i64> {
    body["posts"]
        .as_array()
        .expect("posts array")
        .iter()
        .map(|p| p["id"].as_i64().expect("post id"))
        .collect()
}
