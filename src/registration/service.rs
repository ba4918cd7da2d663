//! Registration orchestrator.
//!
//! Registers this application's domain with the partner platform and manages
//! the local user records that back the user authorization flow.

use std::sync::Arc;
use url::Url;

use crate::errors::{RegistrationError, StorageError};
use crate::partner::{ClientCredentialStore, PartnerTokenManager, USER_AUTHORIZATION_SCOPES};
use crate::registration::types::{
    OAUTH_REDIRECT_PATH, PARTNER_ACCOUNTS_PATH, PartnerAccountRequest, RegisteredUser,
};
use crate::storage::UserStore;

pub struct RegistrationService {
    http_client: reqwest::Client,
    domain: String,
    partner_base_url: Url,
    authorize_url: Url,
    token_manager: Arc<PartnerTokenManager>,
    credentials: Arc<dyn ClientCredentialStore>,
    users: Arc<dyn UserStore>,
}

impl RegistrationService {
    pub fn new(
        http_client: reqwest::Client,
        domain: String,
        partner_base_url: Url,
        authorize_url: Url,
        token_manager: Arc<PartnerTokenManager>,
        credentials: Arc<dyn ClientCredentialStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            http_client,
            domain,
            partner_base_url,
            authorize_url,
            token_manager,
            credentials,
            users,
        }
    }

    /// Register the configured domain with the partner platform.
    ///
    /// Succeeds only on HTTP 200. The call is made once; callers decide whether to retry.
    pub async fn register_application(&self) -> Result<(), RegistrationError> {
        let token = self.token_manager.get_token().await?;
        let url = format!(
            "{}{}",
            self.partner_base_url.as_str().trim_end_matches('/'),
            PARTNER_ACCOUNTS_PATH
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&PartnerAccountRequest {
                domain: &self.domain,
            })
            .send()
            .await
            .map_err(|e| RegistrationError::RegistrationFailed {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            tracing::error!(status = status.as_u16(), body = %body, domain = %self.domain, "partner account registration failed");
            return Err(RegistrationError::RegistrationFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        tracing::info!(domain = %self.domain, "registered partner account");
        Ok(())
    }

    /// Create a user record and the authorization URL the user must visit.
    pub async fn register_user(&self, username: &str) -> Result<RegisteredUser, RegistrationError> {
        if username.trim().is_empty() {
            return Err(RegistrationError::InvalidUsername);
        }

        // Read before creating the record so a missing client id leaves nothing behind.
        let client_id = self.credentials.read_client_id().await?;

        let user = self
            .users
            .create_user(username)
            .await
            .map_err(RegistrationError::PersistenceFailed)?;

        let redirect_uri = format!("https://{}{}", self.domain, OAUTH_REDIRECT_PATH);
        let registration_url = Url::parse_with_params(
            self.authorize_url.as_str(),
            &[
                ("response_type", "code"),
                ("client_id", client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", USER_AUTHORIZATION_SCOPES),
                ("state", user.registration_code.as_str()),
                ("show_keypair_step", "true"),
            ],
        )?;

        tracing::info!(user_id = %user.id, "registered user");

        Ok(RegisteredUser {
            user_id: user.id,
            registration_code: user.registration_code,
            registration_url: registration_url.to_string(),
        })
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), RegistrationError> {
        match self.users.delete_user(user_id).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "deleted user");
                Ok(())
            }
            Err(StorageError::NotFound(_)) => Err(RegistrationError::NotFound(user_id.to_string())),
            Err(err) => Err(RegistrationError::PersistenceFailed(err)),
        }
    }
}
