use super::{tags, PostStore, PostUnitOfWork};
use crate::error::Result;
use crate::models::{NewPost, Post};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeSet;
use tracing::debug;
use validator::Validate;

/// Post columns plus the aggregated, ascending author ids.
const POST_COLUMNS: &str = r#"
    p.id, p.text, p.likes, p.reads, p.popularity, p.tags,
    COALESCE(
        ARRAY_AGG(up.user_id ORDER BY up.user_id) FILTER (WHERE up.user_id IS NOT NULL),
        '{}'
    ) AS author_ids
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    likes: i64,
    reads: i64,
    popularity: f64,
    tags: String,
    author_ids: Vec<i64>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            text: row.text,
            likes: row.likes,
            reads: row.reads,
            popularity: row.popularity,
            tags: tags::split(&row.tags),
            author_ids: row.author_ids,
        }
    }
}

/// PostgreSQL-backed post repository
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert or rename a user. Users are owned by the identity service; this
    /// exists for seeding and tests.
    pub async fn upsert_user(&self, user_id: i64, username: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username
            "#,
        )
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn existing_user_ids(&self, user_ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>> {
        let ids: Vec<i64> = user_ids.iter().copied().collect();
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(found.into_iter().collect())
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN user_posts up ON up.post_id = p.id
            WHERE p.id = $1
            GROUP BY p.id
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn find_posts_by_authors(&self, author_ids: &BTreeSet<i64>) -> Result<Vec<Post>> {
        let ids: Vec<i64> = author_ids.iter().copied().collect();
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN user_posts up ON up.post_id = p.id
            WHERE p.id IN (SELECT post_id FROM user_posts WHERE user_id = ANY($1))
            GROUP BY p.id
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(authors = ids.len(), posts = rows.len(), "fetched posts by authors");
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn create_post(&self, author_id: i64, post: &NewPost) -> Result<Post> {
        post.validate()?;

        // Post row and its first authorship row commit together
        let mut tx = self.pool.begin().await?;

        let post_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (text, likes, reads, popularity, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&post.text)
        .bind(post.likes)
        .bind(post.reads)
        .bind(post.popularity)
        .bind(tags::join(&post.tags))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_posts (user_id, post_id) VALUES ($1, $2)")
            .bind(author_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Post {
            id: post_id,
            text: post.text.clone(),
            likes: post.likes,
            reads: post.reads,
            popularity: post.popularity,
            tags: post.tags.clone(),
            author_ids: vec![author_id],
        })
    }

    async fn begin(&self) -> Result<Box<dyn PostUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One sqlx transaction. Rolled back by sqlx if dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PostUnitOfWork for PgUnitOfWork {
    async fn replace_authors(&mut self, post_id: i64, author_ids: &[i64]) -> Result<()> {
        sqlx::query("DELETE FROM user_posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_posts (user_id, post_id)
            SELECT UNNEST($1::BIGINT[]), $2
            "#,
        )
        .bind(author_ids)
        .bind(post_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn replace_tags(&mut self, post_id: i64, tags: &[String]) -> Result<()> {
        sqlx::query("UPDATE posts SET tags = $1 WHERE id = $2")
            .bind(tags::join(tags))
            .bind(post_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn replace_text(&mut self, post_id: i64, text: &str) -> Result<()> {
        sqlx::query("UPDATE posts SET text = $1 WHERE id = $2")
            .bind(text)
            .bind(post_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
