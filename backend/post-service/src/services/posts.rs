/// Post service - creation, author-filtered listing and lookup of posts
///
/// Updates live in `services::mutation`; both halves share `PostService`.
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{Direction, NewPost, Post, SortBy, User};
use crate::services::authors::{resolve_authors, AuthorResolution};
use crate::services::mutation::check_tags;
use crate::services::params::FetchPostsQuery;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

pub const POST_NOT_FOUND: &str = "The post you requested does not exist in the database.";

/// Result of an author-filtered listing.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedPosts {
    Posts(Vec<Post>),
    /// No requested author is an existing user.
    NoMatchingAuthors,
}

#[derive(Clone)]
pub struct PostService {
    pub(crate) store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn PostStore {
        self.store.as_ref()
    }

    /// Resolve a token subject to an existing user.
    pub async fn authenticate(&self, user_id: i64) -> Result<User> {
        if self.store.user_exists(user_id).await? {
            Ok(User { id: user_id })
        } else {
            Err(AppError::Unauthenticated(
                "Authentication required: unknown user".to_string(),
            ))
        }
    }

    /// Create a post with `author` as its only author.
    pub async fn create_post(&self, author: &User, text: String, tags: Vec<String>) -> Result<Post> {
        check_tags(&tags)?;
        let post = self
            .store
            .create_post(author.id, &NewPost::new(text, tags))
            .await?;

        info!(post_id = post.id, user_id = author.id, "post created");
        Ok(post)
    }

    /// Posts written by at least one of the requested authors, each once,
    /// ordered by the requested field with ascending id as tie-break.
    pub async fn fetch_posts(&self, query: &FetchPostsQuery) -> Result<FetchedPosts> {
        let authors = match resolve_authors(self.store(), &query.author_ids).await? {
            AuthorResolution::Resolved(authors) => authors,
            AuthorResolution::NoMatchingAuthors => return Ok(FetchedPosts::NoMatchingAuthors),
        };

        let posts = self.store.find_posts_by_authors(&authors).await?;
        debug!(
            authors = authors.len(),
            posts = posts.len(),
            sort_by = %query.sort_by,
            direction = %query.direction,
            "fetched posts"
        );

        Ok(FetchedPosts::Posts(sort_posts(
            posts,
            query.sort_by,
            query.direction,
        )))
    }

    /// Parse a path segment and load the post it names.
    pub async fn locate_post(&self, raw_post_id: &str) -> Result<Post> {
        let post_id = parse_post_id(raw_post_id)?;
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))
    }
}

pub fn parse_post_id(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        AppError::Validation(
            "Please use a number to represent the id of the post you want to update. A sample acceptable path: /api/posts/1 versus a sample unacceptable path: /api/posts/one"
                .to_string(),
        )
    })
}

/// Drop repeated post ids, then order by `sort_by`/`direction`. Equal keys
/// fall back to ascending id regardless of direction.
pub fn sort_posts(posts: Vec<Post>, sort_by: SortBy, direction: Direction) -> Vec<Post> {
    let mut seen = BTreeSet::new();
    let mut posts: Vec<Post> = posts.into_iter().filter(|p| seen.insert(p.id)).collect();

    posts.sort_by(|a, b| {
        direction
            .apply(sort_by.compare(a, b))
            .then_with(|| a.id.cmp(&b.id))
    });
    posts
}
