pub mod auth;
pub mod response;

pub use auth::admin_auth_middleware;
pub use response::{ApiResponse, ApiResult};
