/// Author id resolution against the user table
use crate::db::PostStore;
use crate::error::{AppError, Result};
use std::collections::BTreeSet;
use tracing::debug;

pub const NO_MATCHING_AUTHORS: &str =
    "None of the author id(s) you requested exist in the database.";

pub const UNKNOWN_AUTHOR_IDS: &str = "One or more authorIds provided is invalid. Please make sure every id in `authorIds` belongs to an existing user.";

/// Outcome of resolving requested author ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorResolution {
    /// Non-empty set of ids that belong to existing users.
    Resolved(BTreeSet<i64>),
    /// None of the candidates exist. Not an error: the answer is "nothing".
    NoMatchingAuthors,
}

/// Keep only the candidates that are existing users (one batched lookup).
pub async fn resolve_authors(
    store: &dyn PostStore,
    candidates: &BTreeSet<i64>,
) -> Result<AuthorResolution> {
    if candidates.is_empty() {
        return Ok(AuthorResolution::NoMatchingAuthors);
    }

    let existing = store.existing_user_ids(candidates).await?;
    debug!(
        requested = candidates.len(),
        existing = existing.len(),
        "resolved author ids"
    );

    if existing.is_empty() {
        Ok(AuthorResolution::NoMatchingAuthors)
    } else {
        Ok(AuthorResolution::Resolved(existing))
    }
}

/// Strict variant for writes: every id must exist.
pub async fn ensure_authors_exist(store: &dyn PostStore, author_ids: &[i64]) -> Result<()> {
    let requested: BTreeSet<i64> = author_ids.iter().copied().collect();
    let existing = store.existing_user_ids(&requested).await?;

    if existing.len() == requested.len() {
        Ok(())
    } else {
        Err(AppError::Validation(UNKNOWN_AUTHOR_IDS.to_string()))
    }
}
