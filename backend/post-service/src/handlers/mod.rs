/// HTTP handlers for post endpoints
///
/// - `posts`: create, fetch by authors, partial update
/// - `render`: JSON shapes the handlers respond with
/// - `health`: liveness and store readiness
pub mod health;
pub mod posts;
pub mod render;

use actix_web::web;

pub use posts::{create_post, fetch_posts, update_post};

/// Register post routes. Mounted under the authenticated `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/posts")
            .route(web::get().to(fetch_posts))
            .route(web::post().to(create_post)),
    )
    .service(web::resource("/posts/{post_id}").route(web::patch().to(update_post)));
}
