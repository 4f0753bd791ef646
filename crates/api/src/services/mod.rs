//! Application services used by route handlers.

pub mod auth;
pub mod cookies;
pub mod oauth;

pub use auth::{AuthError, AuthResult, AuthService, TokenPair};
pub use cookies::CookieHelper;
pub use oauth::{HttpOAuthProvider, OAuthError, OAuthProvider, OAuthUserInfo};
