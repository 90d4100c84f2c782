//! Populate a development database with a few users and posts.
//!
//! Reads `DATABASE_URL` and the `DB_*` pool variables. Safe to re-run: users
//! are upserted, and posts are only inserted into an empty `posts` table.

use anyhow::{Context, Result};
use db_pool::{create_pool, DbConfig};
use post_service::db::{PgPostStore, PostStore};
use post_service::models::NewPost;
use std::collections::BTreeSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USERS: [(i64, &str); 4] = [
    (1, "santiago"),
    (2, "thomas"),
    (3, "rylee"),
    (4, "kinley"),
];

struct SeedPost {
    author_id: i64,
    text: &'static str,
    tags: &'static [&'static str],
    likes: i64,
    reads: i64,
    popularity: f64,
}

const POSTS: [SeedPost; 5] = [
    SeedPost {
        author_id: 1,
        text: "Excepteur occaecat minim reprehenderit cupidatat dolore voluptate velit labore pariatur culpa esse mollit.",
        tags: &["tech", "health"],
        likes: 12,
        reads: 1200,
        popularity: 0.19,
    },
    SeedPost {
        author_id: 1,
        text: "Ea cillum incididunt consequat ullamco nisi aute labore cupidatat exercitation et sunt nostrud.",
        tags: &["tech"],
        likes: 104,
        reads: 200,
        popularity: 0.7,
    },
    SeedPost {
        author_id: 2,
        text: "Proident tempor est nulla irure ad est mollit quis sint adipisicing labore.",
        tags: &["history", "culture"],
        likes: 10,
        reads: 32,
        popularity: 0.7,
    },
    SeedPost {
        author_id: 2,
        text: "Voluptate consequat sint qui ipsum veniam duis nisi aliquip.",
        tags: &["startups", "tech"],
        likes: 50,
        reads: 300,
        popularity: 0.25,
    },
    SeedPost {
        author_id: 3,
        text: "Laboris esse officia ipsum sint qui commodo esse amet.",
        tags: &["science"],
        likes: 0,
        reads: 0,
        popularity: 0.0,
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_config = DbConfig::from_env("post-service-seed").map_err(anyhow::Error::msg)?;
    let pool = create_pool(db_config)
        .await
        .context("failed to connect to database")?;

    let store = PgPostStore::new(pool);
    store.run_migrations().await.context("migrations failed")?;

    for (id, username) in USERS {
        store
            .upsert_user(id, username)
            .await
            .with_context(|| format!("failed to upsert user {id}"))?;
    }
    tracing::info!(users = USERS.len(), "users seeded");

    let all_users: BTreeSet<i64> = USERS.iter().map(|(id, _)| *id).collect();
    let existing = store.find_posts_by_authors(&all_users).await?;
    if !existing.is_empty() {
        tracing::info!(posts = existing.len(), "posts already present, skipping");
        return Ok(());
    }

    for seed in &POSTS {
        let tags = seed.tags.iter().map(|t| t.to_string()).collect();
        let new_post = NewPost::new(seed.text, tags).with_metrics(
            seed.likes,
            seed.reads,
            seed.popularity,
        );

        let post = store
            .create_post(seed.author_id, &new_post)
            .await
            .with_context(|| format!("failed to insert post for user {}", seed.author_id))?;
        tracing::info!(post_id = post.id, author_id = seed.author_id, "post seeded");
    }

    Ok(())
}
