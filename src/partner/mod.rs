//! Partner platform authentication: client credentials, token issuance and the shared token cache.

pub mod credentials;
pub mod token_issuer;
pub mod token_manager;
pub mod types;

pub use credentials::{ClientCredentialStore, FileClientCredentialStore};
pub use token_issuer::{HttpTokenIssuer, TokenIssuer};
pub use token_manager::PartnerTokenManager;
pub use types::{
    CachedToken, ClientCredentials, IssuedToken, PARTNER_TOKEN_SCOPES, TOKEN_SAFETY_MARGIN,
    USER_AUTHORIZATION_SCOPES,
};
