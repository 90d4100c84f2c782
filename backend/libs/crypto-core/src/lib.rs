//! Shared cryptographic helpers for backend services.

pub mod jwt;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
