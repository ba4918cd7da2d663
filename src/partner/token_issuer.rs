//! Client-credentials grant against the partner token endpoint.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::errors::PartnerTokenError;
use crate::partner::types::{
    BEARER_TOKEN_TYPE, ClientCredentials, IssuedToken, PARTNER_TOKEN_SCOPES, TOKEN_SAFETY_MARGIN,
    TokenResponse,
};

/// Exchanges client credentials for a partner bearer token.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, credentials: &ClientCredentials)
    -> Result<IssuedToken, PartnerTokenError>;
}

/// Issues tokens over HTTP using the shared `reqwest::Client`.
///
/// The client's configured timeout bounds every request.
#[derive(Clone)]
pub struct HttpTokenIssuer {
    http_client: reqwest::Client,
    token_url: Url,
    audience: String,
}

impl HttpTokenIssuer {
    pub fn new(http_client: reqwest::Client, token_url: Url, audience: String) -> Self {
        Self {
            http_client,
            token_url,
            audience,
        }
    }
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    async fn issue(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<IssuedToken, PartnerTokenError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("audience", self.audience.as_str()),
            ("scope", PARTNER_TOKEN_SCOPES),
        ];

        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| PartnerTokenError::UpstreamUnreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PartnerTokenError::UpstreamUnreachable(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %body, "token endpoint rejected client credentials");
            return Err(PartnerTokenError::AuthenticationRejected {
                status: status.as_u16(),
            });
        }

        parse_token_response(&body)
    }
}

/// Validate a successful token endpoint body.
pub fn parse_token_response(body: &str) -> Result<IssuedToken, PartnerTokenError> {
    let token: TokenResponse = serde_json::from_str(body)
        .map_err(|e| PartnerTokenError::MalformedResponse(e.to_string()))?;

    if token.token_type != BEARER_TOKEN_TYPE {
        return Err(PartnerTokenError::UnsupportedTokenType(token.token_type));
    }

    if token.access_token.is_empty() {
        return Err(PartnerTokenError::MalformedResponse(
            "access_token is empty".to_string(),
        ));
    }

    // Must outlive the safety margin to be usable at all.
    let expires_in = Duration::from_secs(token.expires_in);
    if expires_in <= TOKEN_SAFETY_MARGIN {
        return Err(PartnerTokenError::MalformedResponse(format!(
            "expires_in of {}s does not exceed the {}s safety margin",
            token.expires_in,
            TOKEN_SAFETY_MARGIN.as_secs()
        )));
    }

    Ok(IssuedToken {
        access_token: token.access_token,
        expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Form, Router, http::StatusCode, routing::post};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    async fn spawn_stub(router: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{address}/oauth2/v3/token")).unwrap()
    }

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            client_id: "client-123".to_string(),
            client_secret: "secret-456".to_string(),
        }
    }

    fn issuer(token_url: Url) -> HttpTokenIssuer {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpTokenIssuer::new(
            http_client,
            token_url,
            "https://fleet-api.example.com".to_string(),
        )
    }

    #[tokio::test]
    async fn test_issue_sends_client_credentials_grant() {
        let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/oauth2/v3/token",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(form);
                    r#"{"access_token":"T","token_type":"Bearer","expires_in":3600}"#
                }
            }),
        );
        let token_url = spawn_stub(router).await;

        let issued = issuer(token_url).issue(&credentials()).await.unwrap();

        assert_eq!(issued.access_token, "T");
        assert_eq!(issued.expires_in, Duration::from_secs(3600));

        let forms = seen.lock().unwrap();
        assert_eq!(forms.len(), 1);
        let form = &forms[0];
        assert_eq!(form["grant_type"], "client_credentials");
        assert_eq!(form["client_id"], "client-123");
        assert_eq!(form["client_secret"], "secret-456");
        assert_eq!(form["audience"], "https://fleet-api.example.com");
        assert_eq!(form["scope"], PARTNER_TOKEN_SCOPES);
    }

    #[tokio::test]
    async fn test_issue_maps_error_status_to_rejection() {
        let router = Router::new().route(
            "/oauth2/v3/token",
            post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":"invalid_client"}"#) }),
        );
        let token_url = spawn_stub(router).await;

        let err = issuer(token_url).issue(&credentials()).await.unwrap_err();
        assert_eq!(err, PartnerTokenError::AuthenticationRejected { status: 401 });
    }

    #[tokio::test]
    async fn test_issue_rejects_non_bearer_tokens() {
        let router = Router::new().route(
            "/oauth2/v3/token",
            post(|| async { r#"{"access_token":"T","token_type":"mac","expires_in":3600}"# }),
        );
        let token_url = spawn_stub(router).await;

        let err = issuer(token_url).issue(&credentials()).await.unwrap_err();
        assert_eq!(err, PartnerTokenError::UnsupportedTokenType("mac".to_string()));
    }

    #[tokio::test]
    async fn test_issue_reports_malformed_body() {
        let router = Router::new().route("/oauth2/v3/token", post(|| async { "<html>oops</html>" }));
        let token_url = spawn_stub(router).await;

        let err = issuer(token_url).issue(&credentials()).await.unwrap_err();
        assert!(matches!(err, PartnerTokenError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_issue_reports_unreachable_endpoint() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let token_url = Url::parse(&format!("http://{address}/oauth2/v3/token")).unwrap();

        let err = issuer(token_url).issue(&credentials()).await.unwrap_err();
        assert!(matches!(err, PartnerTokenError::UpstreamUnreachable(_)));
    }

    #[test]
    fn test_parse_token_response_rejects_empty_token() {
        let err = parse_token_response(r#"{"access_token":"","token_type":"Bearer","expires_in":60}"#)
            .unwrap_err();
        assert!(matches!(err, PartnerTokenError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_token_response_rejects_lifetime_within_margin() {
        for expires_in in [0, 30, 60] {
            let body = format!(
                r#"{{"access_token":"T","token_type":"Bearer","expires_in":{expires_in}}}"#
            );
            let err = parse_token_response(&body).unwrap_err();
            assert!(
                matches!(err, PartnerTokenError::MalformedResponse(_)),
                "expires_in={expires_in}: {err:?}"
            );
        }

        let issued =
            parse_token_response(r#"{"access_token":"T","token_type":"Bearer","expires_in":61}"#)
                .unwrap();
        assert_eq!(issued.expires_in, Duration::from_secs(61));
    }

    #[tokio::test]
    async fn test_issue_times_out_on_silent_endpoint() {
        let router = Router::new().route(
            "/oauth2/v3/token",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                r#"{"access_token":"T","token_type":"Bearer","expires_in":3600}"#
            }),
        );
        let token_url = spawn_stub(router).await;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let issuer = HttpTokenIssuer::new(
            http_client,
            token_url,
            "https://fleet-api.example.com".to_string(),
        );

        let started = std::time::Instant::now();
        let err = issuer.issue(&credentials()).await.unwrap_err();
        assert!(matches!(err, PartnerTokenError::UpstreamUnreachable(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_parse_token_response_requires_expiry() {
        let err = parse_token_response(r#"{"access_token":"T","token_type":"Bearer"}"#).unwrap_err();
        assert!(matches!(err, PartnerTokenError::MalformedResponse(_)));
    }
}
