/// Data models for post-service
///
/// - `User`: identity owned by the identity collaborator; only the id matters here
/// - `Post`: a blog post together with its current author ids
/// - `NewPost`: validated input for inserting a post
/// - `SortBy` / `Direction`: the accepted sort specification for post listings
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
}

/// A post as seen by the service. `tags` is always a list; how the store
/// persists it is the store's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub likes: i64,
    pub reads: i64,
    pub popularity: f64,
    pub tags: Vec<String>,
    /// Ascending, no duplicates.
    pub author_ids: Vec<i64>,
}

impl Post {
    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_ids.binary_search(&user_id).is_ok()
    }
}

/// Values for a post about to be inserted.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, message = "Must provide text for the new post"))]
    pub text: String,
    pub tags: Vec<String>,
    #[validate(range(min = 0, message = "likes cannot be negative"))]
    pub likes: i64,
    #[validate(range(min = 0, message = "reads cannot be negative"))]
    pub reads: i64,
    #[validate(range(min = 0.0, max = 1.0, message = "Popularity should be between 0 and 1"))]
    pub popularity: f64,
}

impl NewPost {
    /// A fresh post: no likes, no reads, zero popularity.
    pub fn new(text: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            text: text.into(),
            tags,
            likes: 0,
            reads: 0,
            popularity: 0.0,
        }
    }

    pub fn with_metrics(mut self, likes: i64, reads: i64, popularity: f64) -> Self {
        self.likes = likes;
        self.reads = reads;
        // -0.0 passes the range check; store it as 0.0
        self.popularity = if popularity == 0.0 { 0.0 } else { popularity };
        self
    }
}

/// Field a post listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Id,
    Reads,
    Likes,
    Popularity,
}

impl SortBy {
    pub const ACCEPTED: [&'static str; 4] = ["id", "reads", "likes", "popularity"];

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Id => "id",
            SortBy::Reads => "reads",
            SortBy::Likes => "likes",
            SortBy::Popularity => "popularity",
        }
    }

    /// Compares two posts on this field alone.
    pub fn compare(self, a: &Post, b: &Post) -> Ordering {
        match self {
            SortBy::Id => a.id.cmp(&b.id),
            SortBy::Reads => a.reads.cmp(&b.reads),
            SortBy::Likes => a.likes.cmp(&b.likes),
            // Validated values are never NaN; -0.0 and 0.0 compare equal.
            SortBy::Popularity => a
                .popularity
                .partial_cmp(&b.popularity)
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortBy::Id),
            "reads" => Ok(SortBy::Reads),
            "likes" => Ok(SortBy::Likes),
            "popularity" => Ok(SortBy::Popularity),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub const ACCEPTED: [&'static str; 2] = ["asc", "desc"];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
