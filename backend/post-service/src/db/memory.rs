use super::{tags, PostStore, PostUnitOfWork};
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use validator::Validate;

/// Row shape mirrors the SQL schema, tags included.
#[derive(Debug, Clone)]
struct PostRecord {
    text: String,
    likes: i64,
    reads: i64,
    popularity: f64,
    tags: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeSet<i64>,
    posts: BTreeMap<i64, PostRecord>,
    /// post id -> author ids
    authorships: BTreeMap<i64, BTreeSet<i64>>,
    last_post_id: i64,
}

impl MemoryState {
    fn post(&self, post_id: i64) -> Option<Post> {
        let record = self.posts.get(&post_id)?;
        let author_ids = self
            .authorships
            .get(&post_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        Some(Post {
            id: post_id,
            text: record.text.clone(),
            likes: record.likes,
            reads: record.reads,
            popularity: record.popularity,
            tags: tags::split(&record.tags),
            author_ids,
        })
    }
}

/// Process-local post store. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given user ids.
    pub fn with_users(user_ids: impl IntoIterator<Item = i64>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            state.users.extend(user_ids);
        }
        store
    }

    pub fn add_user(&self, user_id: i64) -> Result<()> {
        write(&self.state)?.users.insert(user_id);
        Ok(())
    }
}

fn read(state: &RwLock<MemoryState>) -> Result<RwLockReadGuard<'_, MemoryState>> {
    state
        .read()
        .map_err(|_| AppError::Internal("post store lock poisoned".to_string()))
}

fn write(state: &RwLock<MemoryState>) -> Result<RwLockWriteGuard<'_, MemoryState>> {
    state
        .write()
        .map_err(|_| AppError::Internal("post store lock poisoned".to_string()))
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        Ok(read(&self.state)?.users.contains(&user_id))
    }

    async fn existing_user_ids(&self, user_ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>> {
        let state = read(&self.state)?;
        Ok(user_ids.intersection(&state.users).copied().collect())
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(read(&self.state)?.post(post_id))
    }

    async fn find_posts_by_authors(&self, author_ids: &BTreeSet<i64>) -> Result<Vec<Post>> {
        let state = read(&self.state)?;
        let posts = state
            .authorships
            .iter()
            .filter(|(_, authors)| !authors.is_disjoint(author_ids))
            .filter_map(|(post_id, _)| state.post(*post_id))
            .collect();

        Ok(posts)
    }

    async fn create_post(&self, author_id: i64, post: &NewPost) -> Result<Post> {
        post.validate()?;

        let mut state = write(&self.state)?;
        if !state.users.contains(&author_id) {
            return Err(AppError::Database(format!(
                "author {} violates user_posts foreign key",
                author_id
            )));
        }

        state.last_post_id += 1;
        let post_id = state.last_post_id;
        state.posts.insert(
            post_id,
            PostRecord {
                text: post.text.clone(),
                likes: post.likes,
                reads: post.reads,
                popularity: post.popularity,
                tags: tags::join(&post.tags),
            },
        );
        state
            .authorships
            .insert(post_id, BTreeSet::from([author_id]));

        state
            .post(post_id)
            .ok_or_else(|| AppError::Internal("inserted post vanished".to_string()))
    }

    async fn begin(&self) -> Result<Box<dyn PostUnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }

    async fn ping(&self) -> Result<()> {
        read(&self.state).map(|_| ())
    }
}

#[derive(Debug)]
enum StagedWrite {
    Authors(i64, Vec<i64>),
    Tags(i64, String),
    Text(i64, String),
}

impl StagedWrite {
    fn post_id(&self) -> i64 {
        match self {
            StagedWrite::Authors(id, _) | StagedWrite::Tags(id, _) | StagedWrite::Text(id, _) => {
                *id
            }
        }
    }
}

/// Writes are buffered and applied under one write lock on commit, so
/// readers never see a half-applied update.
pub struct InMemoryUnitOfWork {
    state: Arc<RwLock<MemoryState>>,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl PostUnitOfWork for InMemoryUnitOfWork {
    async fn replace_authors(&mut self, post_id: i64, author_ids: &[i64]) -> Result<()> {
        self.staged
            .push(StagedWrite::Authors(post_id, author_ids.to_vec()));
        Ok(())
    }

    async fn replace_tags(&mut self, post_id: i64, tags: &[String]) -> Result<()> {
        self.staged
            .push(StagedWrite::Tags(post_id, tags::join(tags)));
        Ok(())
    }

    async fn replace_text(&mut self, post_id: i64, text: &str) -> Result<()> {
        self.staged
            .push(StagedWrite::Text(post_id, text.to_string()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnitOfWork { state: shared, staged } = *self;
        let mut state = write(&shared)?;

        // Check every constraint before touching anything.
        for op in &staged {
            if !state.posts.contains_key(&op.post_id()) {
                return Err(AppError::Database(format!(
                    "post {} no longer exists",
                    op.post_id()
                )));
            }
            if let StagedWrite::Authors(_, author_ids) = op {
                if let Some(missing) = author_ids.iter().find(|id| !state.users.contains(*id)) {
                    return Err(AppError::Database(format!(
                        "author {} violates user_posts foreign key",
                        missing
                    )));
                }
            }
        }

        for op in staged {
            match op {
                StagedWrite::Authors(post_id, author_ids) => {
                    state
                        .authorships
                        .insert(post_id, author_ids.into_iter().collect());
                }
                StagedWrite::Tags(post_id, stored) => {
                    if let Some(record) = state.posts.get_mut(&post_id) {
                        record.tags = stored;
                    }
                }
                StagedWrite::Text(post_id, text) => {
                    if let Some(record) = state.posts.get_mut(&post_id) {
                        record.text = text;
                    }
                }
            }
        }

        Ok(())
    }
}
