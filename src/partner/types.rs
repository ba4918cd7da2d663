//! Partner platform token types and protocol constants.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Scopes requested by the client-credentials grant.
pub const PARTNER_TOKEN_SCOPES: &str =
    "openid user_data vehicle_device_data vehicle_cmds vehicle_charging_cmds";

/// Scopes requested from end users in the authorization-code flow.
pub const USER_AUTHORIZATION_SCOPES: &str =
    "openid offline_access user_data vehicle_device_data vehicle_cmds vehicle_charging_cmds";

/// Subtracted from the issuer-reported lifetime before a token is cached.
pub const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// The only token type the partner platform is expected to issue.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// Partner application credentials, loaded for a single refresh.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Successful token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// A bearer token accepted from the issuer, before caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

/// The token held by the manager.
///
/// An empty `value` means nothing is cached. `expires_at` already has the
/// safety margin subtracted.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn empty() -> Self {
        Self {
            value: String::new(),
            expires_at: Instant::now(),
        }
    }

    /// Cache a freshly issued token, measured from `issued_at`.
    pub fn from_issued(token: IssuedToken, issued_at: Instant) -> Self {
        let lifetime = token.expires_in.saturating_sub(TOKEN_SAFETY_MARGIN);
        Self {
            value: token.access_token,
            expires_at: issued_at + lifetime,
        }
    }

    /// Both conditions must hold: a token is present and it has not expired.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        !self.value.is_empty() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cached_token_subtracts_safety_margin() {
        let issued_at = Instant::now();
        let cached = CachedToken::from_issued(
            IssuedToken {
                access_token: "T".to_string(),
                expires_in: Duration::from_secs(3600),
            },
            issued_at,
        );

        assert_eq!(cached.expires_at, issued_at + Duration::from_secs(3540));
        assert!(cached.is_valid_at(issued_at + Duration::from_secs(3539)));
        assert!(!cached.is_valid_at(issued_at + Duration::from_secs(3540)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_token_is_never_valid() {
        let mut cached = CachedToken::empty();
        cached.expires_at = Instant::now() + Duration::from_secs(3600);
        assert!(!cached.is_valid_at(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_lifetime_is_expired_immediately() {
        let issued_at = Instant::now();
        let cached = CachedToken::from_issued(
            IssuedToken {
                access_token: "short".to_string(),
                expires_in: Duration::from_secs(30),
            },
            issued_at,
        );
        assert!(!cached.is_valid_at(issued_at));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = ClientCredentials {
            client_id: "client".to_string(),
            client_secret: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("client"));
        assert!(!rendered.contains("hunter2"));
    }
}
