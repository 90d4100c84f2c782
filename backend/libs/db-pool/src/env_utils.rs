//! Environment variable parsing helpers

use std::str::FromStr;

/// Parsed value of `key`, or `default` when unset or unparsable.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parsed value of `key`; missing or unparsable is an error.
pub fn parse_env_required<T: FromStr>(key: &str) -> Result<T, String> {
    std::env::var(key)
        .map_err(|_| format!("{} environment variable not set", key))?
        .parse()
        .map_err(|_| format!("Failed to parse environment variable {}", key))
}
