/// Business logic layer for post-service
///
/// - `params`: query-string validation for listings
/// - `authors`: author id resolution
/// - `posts`: creation, author-filtered listing and lookup
/// - `mutation`: validated partial updates
pub mod authors;
pub mod mutation;
pub mod params;
pub mod posts;

pub use authors::AuthorResolution;
pub use mutation::PostPatch;
pub use params::{parse_fetch_params, FetchPostsQuery};
pub use posts::{FetchedPosts, PostService};
