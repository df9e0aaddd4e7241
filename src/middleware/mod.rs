pub mod auth;
pub mod response;

pub use auth::{require_credentials, require_jwt, CurrentUser, MeteredUser};
pub use response::{ApiResponse, ApiResult};
