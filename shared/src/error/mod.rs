//! Unified error handling
//!
//! Error codes, categories, HTTP status mapping, and the application error
//! type shared between the server and API clients.

pub mod category;
pub mod codes;
pub mod http;
pub mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
