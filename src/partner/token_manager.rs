//! Process-wide partner bearer token cache with single-flight refresh.
//!
//! One async mutex covers the whole check-then-refresh sequence, so at most one
//! refresh is outstanding at any time. Callers that queued behind a refresh
//! receive that refresh's outcome: the cached token when it succeeded, a clone
//! of its error when it failed. A refresh that is cancelled before it completes
//! leaves the cache untouched and does not count as an outcome, so the next
//! waiter simply tries again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::PartnerTokenError;
use crate::partner::credentials::ClientCredentialStore;
use crate::partner::token_issuer::TokenIssuer;
use crate::partner::types::{CachedToken, IssuedToken};

struct TokenState {
    cached: CachedToken,
    last_failure: Option<PartnerTokenError>,
}

pub struct PartnerTokenManager {
    credentials: Arc<dyn ClientCredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
    state: Mutex<TokenState>,
    /// Number of refreshes that ran to completion, successful or not.
    completed_refreshes: AtomicU64,
}

impl PartnerTokenManager {
    pub fn new(credentials: Arc<dyn ClientCredentialStore>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            credentials,
            issuer,
            state: Mutex::new(TokenState {
                cached: CachedToken::empty(),
                last_failure: None,
            }),
            completed_refreshes: AtomicU64::new(0),
        }
    }

    /// Return a bearer token valid for at least the safety margin, refreshing if needed.
    pub async fn get_token(&self) -> Result<String, PartnerTokenError> {
        let observed = self.completed_refreshes.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if state.cached.is_valid_at(Instant::now()) {
            return Ok(state.cached.value.clone());
        }

        // A refresh finished while we waited for the lock and it failed: share its error.
        if self.completed_refreshes.load(Ordering::Acquire) != observed {
            if let Some(failure) = &state.last_failure {
                return Err(failure.clone());
            }
        }

        let refresh_started = Instant::now();
        match self.refresh().await {
            Ok(issued) => {
                let lifetime = issued.expires_in;
                let cached = CachedToken::from_issued(issued, refresh_started);
                let token = cached.value.clone();
                state.cached = cached;
                state.last_failure = None;
                self.completed_refreshes.fetch_add(1, Ordering::Release);
                tracing::info!(lifetime_secs = lifetime.as_secs(), "refreshed partner token");
                Ok(token)
            }
            Err(err) => {
                state.last_failure = Some(err.clone());
                self.completed_refreshes.fetch_add(1, Ordering::Release);
                tracing::error!(error = %err, "partner token refresh failed");
                Err(err)
            }
        }
    }

    async fn refresh(&self) -> Result<IssuedToken, PartnerTokenError> {
        let credentials = self
            .credentials
            .read_credentials()
            .await
            .map_err(|e| PartnerTokenError::CredentialUnavailable(e.to_string()))?;
        self.issuer.issue(&credentials).await
    }
}
