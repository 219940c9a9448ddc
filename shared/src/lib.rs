//! Shared types for the laundry back-office
//!
//! Common types used by the server and API clients: unified error codes,
//! the application error type, the API response envelope, auth DTOs and
//! small utilities.

pub mod client;
pub mod error;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
