/// Wire shapes for posts
///
/// Field declaration order is the serialized key order.
use crate::models::Post;
use serde::Serialize;

/// A post inside a listing. Keys are alphabetical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub likes: i64,
    pub popularity: f64,
    pub reads: i64,
    pub tags: Vec<String>,
    pub text: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            likes: post.likes,
            popularity: post.popularity,
            reads: post.reads,
            tags: post.tags.clone(),
            text: post.text.clone(),
        }
    }
}

/// A single post, with its authors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub id: i64,
    #[serde(rename = "authorIds")]
    pub author_ids: Vec<i64>,
    pub likes: i64,
    pub popularity: f64,
    pub reads: i64,
    pub tags: Vec<String>,
    pub text: String,
}

impl From<&Post> for PostDetail {
    fn from(post: &Post) -> Self {
        let mut author_ids = post.author_ids.clone();
        author_ids.sort_unstable();
        author_ids.dedup();

        Self {
            id: post.id,
            author_ids,
            likes: post.likes,
            popularity: post.popularity,
            reads: post.reads,
            tags: post.tags.clone(),
            text: post.text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PostsResponse {
    pub fn from_posts(posts: &[Post]) -> Self {
        Self {
            posts: posts.iter().map(PostSummary::from).collect(),
            warning: None,
        }
    }

    pub fn empty_with_warning(warning: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            warning: Some(warning.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostDetail,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            post: PostDetail::from(post),
        }
    }
}
