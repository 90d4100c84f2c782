/// Post handlers - HTTP endpoints for post operations
///
/// Every handler authenticates first, so a caller without a valid user never
/// learns anything about its request beyond the 401.
use crate::error::{AppError, Result};
use crate::handlers::render::{PostResponse, PostsResponse};
use crate::metrics::posts::RequestTimer;
use crate::middleware::UserId;
use crate::models::Post;
use crate::services::authors::NO_MATCHING_AUTHORS;
use crate::services::{parse_fetch_params, FetchedPosts, PostService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

const CREATE_BODY_FORM: &str =
    "Expected `text` as a string and `tags` as a list of strings";

/// `null` is treated the same as an absent key.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(
        required(message = "Must provide text for the new post"),
        length(min = 1, message = "Must provide text for the new post")
    )]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl CreatePostRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let req: Self = serde_json::from_slice(body).map_err(|err| match err.classify() {
            serde_json::error::Category::Data => {
                AppError::Validation(format!("{}: {}", CREATE_BODY_FORM, err))
            }
            _ => AppError::from(err),
        })?;
        req.validate()?;
        Ok(req)
    }
}

/// Create a new post authored by the caller
/// POST /api/posts
pub async fn create_post(
    service: web::Data<PostService>,
    user_id: UserId,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let timer = RequestTimer::start("create");
    let result = create(&service, user_id, &body).await;
    timer.finish(&result);

    result.map(|post| HttpResponse::Ok().json(PostResponse::from(&post)))
}

async fn create(service: &PostService, user_id: UserId, body: &[u8]) -> Result<Post> {
    let user = service.authenticate(user_id.0).await?;

    let req = CreatePostRequest::from_slice(body)?;

    service
        .create_post(
            &user,
            req.text.unwrap_or_default(),
            req.tags.unwrap_or_default(),
        )
        .await
}

/// Posts by any of the requested authors
/// GET /api/posts?authorIds=1,5&sortBy=likes&direction=desc
pub async fn fetch_posts(
    service: web::Data<PostService>,
    user_id: UserId,
    query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse> {
    let timer = RequestTimer::start("fetch");
    let result = fetch(&service, user_id, &query).await;

    match result {
        Ok(FetchedPosts::Posts(posts)) => {
            timer.finish_with("success");
            Ok(HttpResponse::Ok().json(PostsResponse::from_posts(&posts)))
        }
        Ok(FetchedPosts::NoMatchingAuthors) => {
            timer.finish_with("no_matching_authors");
            Ok(HttpResponse::Ok().json(PostsResponse::empty_with_warning(NO_MATCHING_AUTHORS)))
        }
        Err(err) => {
            timer.finish_with(err.label());
            Err(err)
        }
    }
}

async fn fetch(
    service: &PostService,
    user_id: UserId,
    params: &[(String, String)],
) -> Result<FetchedPosts> {
    service.authenticate(user_id.0).await?;
    let query = parse_fetch_params(params)?;
    service.fetch_posts(&query).await
}

/// Partially update a post the caller co-authors
/// PATCH /api/posts/{post_id}
pub async fn update_post(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let timer = RequestTimer::start("update");
    let result = update(&service, user_id, &post_id, &body).await;
    timer.finish(&result);

    result.map(|post| HttpResponse::Ok().json(PostResponse::from(&post)))
}

async fn update(
    service: &PostService,
    user_id: UserId,
    raw_post_id: &str,
    body: &[u8],
) -> Result<Post> {
    let user = service.authenticate(user_id.0).await?;
    let post = service.update_post(&user, raw_post_id, body).await?;

    tracing::debug!(post_id = post.id, user_id = user.id, "update request completed");
    Ok(post)
}
