/// Partial post updates
///
/// A PATCH body is checked field by field into a `PostPatch` before any
/// store write. All writes of one update share a single unit of work that is
/// committed once.
use crate::error::{AppError, Result};
use crate::middleware::permissions::check_post_update;
use crate::models::{Post, User};
use crate::services::authors::ensure_authors_exist;
use crate::services::posts::{PostService, POST_NOT_FOUND};
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

const AUTHOR_IDS: &str = "authorIds";
const TAGS: &str = "tags";
const TEXT: &str = "text";

/// Validated fields of an update. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    /// Deduplicated, first occurrence order.
    pub author_ids: Option<Vec<i64>>,
    pub tags: Option<Vec<String>>,
    pub text: Option<String>,
}

impl PostPatch {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let fields = value.as_object().ok_or_else(|| {
            AppError::Validation("Request body must be a JSON object.".to_string())
        })?;

        let patch = PostPatch {
            author_ids: fields.get(AUTHOR_IDS).map(parse_author_ids).transpose()?,
            tags: fields.get(TAGS).map(parse_tags).transpose()?,
            text: fields.get(TEXT).map(parse_text).transpose()?,
        };

        if patch.is_empty() {
            return Err(AppError::Validation(format!(
                "Please provide at least one of `{AUTHOR_IDS}`, `{TAGS}` or `{TEXT}` to update."
            )));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.author_ids.is_none() && self.tags.is_none() && self.text.is_none()
    }
}

fn parse_author_ids(value: &Value) -> Result<Vec<i64>> {
    let items = value.as_array().ok_or_else(|| {
        AppError::Validation("`authorIds` must be an array of user ids, such as [1, 5].".to_string())
    })?;

    let mut seen = HashSet::new();
    let mut author_ids = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let id = item.as_i64().ok_or_else(|| {
            AppError::Validation(format!("authorIds[{index}] must be an integer user id."))
        })?;
        if seen.insert(id) {
            author_ids.push(id);
        }
    }

    if author_ids.is_empty() {
        return Err(AppError::Validation(
            "`authorIds` must name at least one author.".to_string(),
        ));
    }
    Ok(author_ids)
}

fn parse_tags(value: &Value) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        AppError::Validation("`tags` must be an array of strings.".to_string())
    })?;

    let tags = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                AppError::Validation(format!("tags[{index}] must be a string."))
            })
        })
        .collect::<Result<Vec<String>>>()?;

    check_tags(&tags)?;
    Ok(tags)
}

fn parse_text(value: &Value) -> Result<String> {
    match value.as_str() {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::Validation(
            "`text` must be a non-empty string.".to_string(),
        )),
    }
}

/// Every tag must be a non-empty string.
pub(crate) fn check_tags(tags: &[String]) -> Result<()> {
    match tags.iter().position(|tag| tag.is_empty()) {
        Some(index) => Err(AppError::Validation(format!(
            "tags[{index}] must not be empty."
        ))),
        None => Ok(()),
    }
}

impl PostService {
    /// Locate, authorize, validate, then apply a PATCH body.
    pub async fn update_post(&self, user: &User, raw_post_id: &str, body: &[u8]) -> Result<Post> {
        let post = self.locate_post(raw_post_id).await?;
        check_post_update(user.id, &post)?;

        let patch = PostPatch::from_slice(body)?;
        self.apply_patch(&post, &patch).await
    }

    /// Apply an already validated patch in one unit of work and reload the post.
    pub async fn apply_patch(&self, post: &Post, patch: &PostPatch) -> Result<Post> {
        if let Some(author_ids) = &patch.author_ids {
            ensure_authors_exist(self.store(), author_ids).await?;
        }

        let mut uow = self.store.begin().await?;
        if let Some(author_ids) = &patch.author_ids {
            uow.replace_authors(post.id, author_ids).await?;
        }
        if let Some(tags) = &patch.tags {
            uow.replace_tags(post.id, tags).await?;
        }
        if let Some(text) = &patch.text {
            uow.replace_text(post.id, text).await?;
        }
        uow.commit().await?;

        info!(
            post_id = post.id,
            authors = patch.author_ids.is_some(),
            tags = patch.tags.is_some(),
            text = patch.text.is_some(),
            "post updated"
        );

        self.store
            .find_post(post.id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryPostStore, MockPostStore, PostStore};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn sample_post() -> Post {
        Post {
            id: 1,
            text: "original".to_string(),
            likes: 3,
            reads: 10,
            popularity: 0.5,
            tags: vec!["a".to_string()],
            author_ids: vec![1],
        }
    }

    #[test]
    fn author_ids_are_deduplicated_in_order() {
        let patch = PostPatch::from_value(&json!({ "authorIds": [3, 1, 3, 2] })).unwrap();
        assert_eq!(patch.author_ids, Some(vec![3, 1, 2]));
        assert_eq!(patch.tags, None);
    }

    #[test]
    fn non_integer_author_id_names_the_index() {
        for bad in [json!([1, "2"]), json!([1, 2.5]), json!([1, true])] {
            let err = PostPatch::from_value(&json!({ "authorIds": bad })).unwrap_err();
            assert!(matches!(err, AppError::Validation(msg) if msg.contains("authorIds[1]")));
        }
    }

    #[test]
    fn empty_author_list_is_rejected() {
        let err = PostPatch::from_value(&json!({ "authorIds": [] })).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn tags_must_be_non_empty_strings() {
        let err = PostPatch::from_value(&json!({ "tags": ["ok", 7] })).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("tags[1]")));

        let err = PostPatch::from_value(&json!({ "tags": [""] })).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("tags[0]")));

        let err = PostPatch::from_value(&json!({ "tags": "a,b" })).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn text_must_be_non_empty_string() {
        assert!(PostPatch::from_value(&json!({ "text": "" })).is_err());
        assert!(PostPatch::from_value(&json!({ "text": 5 })).is_err());
        let patch = PostPatch::from_value(&json!({ "text": "new" })).unwrap();
        assert_eq!(patch.text.as_deref(), Some("new"));
    }

    #[test]
    fn body_without_known_fields_is_rejected() {
        assert!(PostPatch::from_value(&json!({})).is_err());
        assert!(PostPatch::from_value(&json!({ "likes": 3 })).is_err());
        assert!(PostPatch::from_value(&json!([1, 2])).is_err());
        assert!(PostPatch::from_slice(b"not json").is_err());
    }

    #[tokio::test]
    async fn unknown_author_never_opens_a_unit_of_work() {
        let mut store = MockPostStore::new();
        store
            .expect_find_post()
            .returning(|_| Ok(Some(sample_post())));
        store
            .expect_existing_user_ids()
            .returning(|ids: &BTreeSet<i64>| Ok(ids.iter().copied().filter(|id| *id != 5).collect()));
        store.expect_begin().never();

        let service = PostService::new(Arc::new(store));
        let err = service
            .update_post(&User { id: 1 }, "1", br#"{"authorIds": [2, 5]}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn non_author_is_rejected_before_body_is_read() {
        let mut store = MockPostStore::new();
        store
            .expect_find_post()
            .returning(|_| Ok(Some(sample_post())));
        store.expect_begin().never();

        let service = PostService::new(Arc::new(store));
        let err = service
            .update_post(&User { id: 3 }, "1", b"garbage")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn all_fields_are_applied_together() {
        let store = Arc::new(InMemoryPostStore::with_users([1, 2]));
        let service = PostService::new(store.clone());
        let author = User { id: 1 };
        let post = service
            .create_post(&author, "first".into(), vec![])
            .await
            .unwrap();

        let body = json!({ "authorIds": [2, 1], "tags": ["x", "y,z"], "text": "second" });
        let updated = service
            .update_post(&author, &post.id.to_string(), body.to_string().as_bytes())
            .await
            .unwrap();

        assert_eq!(updated.author_ids, vec![1, 2]);
        assert_eq!(updated.tags, vec!["x".to_string(), "y,z".to_string()]);
        assert_eq!(updated.text, "second");
        assert_eq!(store.find_post(post.id).await.unwrap(), Some(updated));
    }
}
