/// Authorization checks for post mutations
///
/// Authentication (who is calling) is handled by `JwtAuthMiddleware`; these
/// checks decide whether that caller may change a given post.
use crate::error::{AppError, Result};
use crate::models::Post;

/// The caller must currently be one of the post's authors.
pub fn check_post_authorship(user_id: i64, post: &Post) -> Result<()> {
    if post.is_authored_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "You can only update a post if you are one of its authors.".to_string(),
        ))
    }
}

/// Verify user has access to update a post
pub fn check_post_update(user_id: i64, post: &Post) -> Result<()> {
    check_post_authorship(user_id, post)
}
