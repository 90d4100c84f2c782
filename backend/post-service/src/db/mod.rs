/// Database access layer
///
/// The services only ever talk to the `PostStore` / `PostUnitOfWork` traits.
/// Two adapters implement them:
/// - `PgPostStore`: PostgreSQL through sqlx, one sqlx transaction per unit of work
/// - `InMemoryPostStore`: lock-protected maps, used for tests and local runs
pub mod memory;
pub mod post_repo;
pub(crate) mod tags;

pub use memory::InMemoryPostStore;
pub use post_repo::PgPostStore;

use crate::error::Result;
use crate::models::{NewPost, Post};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Read access plus post creation. Multi-field writes go through `begin`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Whether a user with this id exists.
    async fn user_exists(&self, user_id: i64) -> Result<bool>;

    /// The subset of `user_ids` that belong to existing users.
    async fn existing_user_ids(&self, user_ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>>;

    /// Post by id, with its author ids.
    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    /// Every post with at least one author in `author_ids`. Order unspecified.
    async fn find_posts_by_authors(&self, author_ids: &BTreeSet<i64>) -> Result<Vec<Post>>;

    /// Insert a post with `author_id` as its only author.
    async fn create_post(&self, author_id: i64, post: &NewPost) -> Result<Post>;

    /// Open a unit of work. Nothing staged on it is visible until `commit`.
    async fn begin(&self) -> Result<Box<dyn PostUnitOfWork>>;

    /// Cheap connectivity check for health endpoints.
    async fn ping(&self) -> Result<()>;
}

/// Writes of a single update request. Dropping without `commit` discards them.
#[async_trait]
pub trait PostUnitOfWork: Send {
    /// Delete every authorship row of the post and insert one per id.
    async fn replace_authors(&mut self, post_id: i64, author_ids: &[i64]) -> Result<()>;

    async fn replace_tags(&mut self, post_id: i64, tags: &[String]) -> Result<()>;

    async fn replace_text(&mut self, post_id: i64, text: &str) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
