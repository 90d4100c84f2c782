/// Post Service Library
///
/// Blog posts with many-to-many authorship: creation, author-filtered and
/// sorted listing, and atomic partial updates.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and response shapes
/// - `models`: posts, users and the sort specification
/// - `services`: parameter validation, author resolution, query and mutation logic
/// - `db`: storage traits with PostgreSQL and in-process adapters
/// - `middleware`: JWT authentication and authorship checks
/// - `error`: error types and their HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
