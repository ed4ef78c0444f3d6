pub mod auth;

pub use auth::{auth_middleware, CurrentUser, ACCESS_TOKEN_COOKIE};
