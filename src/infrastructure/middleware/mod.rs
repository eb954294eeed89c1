// Request middleware and extractors

pub mod admin_auth;
pub mod json_extractor;

pub use admin_auth::{admin_auth_middleware, AdminContext};
pub use json_extractor::AppJson;
