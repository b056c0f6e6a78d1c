//! Lendstack Common Library
//!
//! Shared code for the Lendstack catalog service including:
//! - Database entities and repository patterns
//! - The loan renewal rule
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Pagination helpers
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod loans;
pub mod metrics;
pub mod pagination;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Login endpoint unauthenticated callers are redirected to
pub const LOGIN_PATH: &str = "/accounts/login";
