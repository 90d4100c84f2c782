//! Query-string validation for post listings.

use crate::error::{AppError, Result};
use crate::models::{Direction, SortBy};
use std::collections::BTreeSet;

pub const AUTHOR_IDS: &str = "authorIds";
pub const SORT_BY: &str = "sortBy";
pub const DIRECTION: &str = "direction";

/// Recognized parameters with a closed set of values.
const ACCEPTED_VALUES: [(&str, &[&str]); 2] = [
    (SORT_BY, &SortBy::ACCEPTED),
    (DIRECTION, &Direction::ACCEPTED),
];

/// A validated `GET /posts` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPostsQuery {
    pub author_ids: BTreeSet<i64>,
    pub sort_by: SortBy,
    pub direction: Direction,
}

/// Validate raw query pairs in request order.
///
/// Every occurrence of `sortBy`/`direction` must hold an accepted value; the
/// first occurrence is the one used. Unknown keys are ignored.
pub fn parse_fetch_params(params: &[(String, String)]) -> Result<FetchPostsQuery> {
    for (key, value) in params {
        if let Some((_, accepted)) = ACCEPTED_VALUES.iter().find(|(name, _)| name == key) {
            if !accepted.contains(&value.as_str()) {
                return Err(AppError::Validation(format!(
                    "Unacceptable value for {} query parameter. We only accept one of [{}].",
                    key,
                    accepted.join(", ")
                )));
            }
        }
    }

    let first = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let raw_author_ids = first(AUTHOR_IDS).ok_or_else(|| {
        AppError::Validation(
            "Please identify author(s) using the query parameter key `authorIds`."
                .to_string(),
        )
    })?;
    let author_ids = parse_author_ids(raw_author_ids)?;

    // Values were checked above, so parsing cannot fail here.
    let sort_by = first(SORT_BY)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    let direction = first(DIRECTION)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();

    Ok(FetchPostsQuery {
        author_ids,
        sort_by,
        direction,
    })
}

/// Parse `"1, 5,5"` into `{1, 5}`.
pub fn parse_author_ids(raw: &str) -> Result<BTreeSet<i64>> {
    raw.split(',')
        .map(|token| token.trim().parse::<i64>())
        .collect::<std::result::Result<BTreeSet<i64>, _>>()
        .map_err(|_| {
            AppError::Validation(
                "Please provide a query parameter value for `authorIds` as a number or as numbers separated by commas, such as '1,5'."
                    .to_string(),
            )
        })
}
