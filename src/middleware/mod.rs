pub mod auth;
pub mod errors;
pub mod response;

pub use auth::{authenticate, authorize, Allowed, CurrentUser};
pub use response::{ApiResponse, ApiResult};
