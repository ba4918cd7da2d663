use serde::{Deserialize, Serialize};

/// Partner API path that registers this application's domain.
pub const PARTNER_ACCOUNTS_PATH: &str = "/api/1/partner_accounts";

/// Path on our own domain the partner redirects users back to.
pub const OAUTH_REDIRECT_PATH: &str = "/oauth/redirect/tesla";

/// Outcome of a user registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub user_id: String,
    pub registration_code: String,
    /// Authorization URL the user opens to grant access
    pub registration_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PartnerAccountRequest<'a> {
    pub domain: &'a str,
}
