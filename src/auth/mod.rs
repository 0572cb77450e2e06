//! OAuth2 client-credentials authentication against OPERA Cloud.

pub mod credential;
pub mod manager;
pub mod token;

pub use credential::{Credential, Secret};
pub use manager::{TokenManager, TokenProvider};
#[cfg(test)]
pub use manager::MockTokenProvider;
pub use token::{AccessToken, TokenGrant, TokenState, TokenStatus};
