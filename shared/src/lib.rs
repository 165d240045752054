//! Shared types for the voucher platform
//!
//! Error codes, API response envelope, domain models and small pure
//! helpers used by the server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
