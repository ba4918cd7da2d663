//! Environment-based configuration types for the registration service.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;

/// Partner token endpoint used when `PARTNER_TOKEN_URL` is not set.
pub const DEFAULT_PARTNER_TOKEN_URL: &str =
    "https://fleet-auth.prd.vn.cloud.tesla.com/oauth2/v3/token";

/// Partner end-user authorization endpoint used when `PARTNER_AUTHORIZE_URL` is not set.
pub const DEFAULT_PARTNER_AUTHORIZE_URL: &str = "https://auth.tesla.com/oauth2/v3/authorize";

/// Path the partner platform fetches our public key from.
pub const PUBLIC_KEY_WELL_KNOWN_PATH: &str = "/.well-known/appspecific/com.tesla.3p.public-key.pem";

/// Storage backend used when `STORAGE_BACKEND` is not set. `memory` is opt-in only.
#[cfg(feature = "sqlite")]
pub const DEFAULT_STORAGE_BACKEND: &str = "sqlite";
#[cfg(not(feature = "sqlite"))]
pub const DEFAULT_STORAGE_BACKEND: &str = "memory";

/// HTTP server port configuration
#[derive(Clone, Debug)]
pub struct HttpPort(u16);

/// Optional dedicated port for public routes
#[derive(Clone, Debug)]
pub struct PublicHttpPort(Option<u16>);

/// Certificate bundles for HTTPS connections
#[derive(Clone, Debug)]
pub struct CertificateBundles(Vec<String>);

/// HTTP client timeout configuration
#[derive(Clone, Debug)]
pub struct HttpClientTimeout(Duration);

/// An absolute http(s) URL read from the environment
#[derive(Clone, Debug)]
pub struct EndpointUrl(Url);

/// The bare domain this application is registered under
#[derive(Clone, Debug)]
pub struct Domain(String);

/// Main application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub version: String,
    pub domain: Domain,
    pub partner_base_url: EndpointUrl,
    pub partner_token_url: EndpointUrl,
    pub partner_authorize_url: EndpointUrl,
    pub client_id_path: PathBuf,
    pub client_secret_path: PathBuf,
    pub public_key_path: PathBuf,
    pub http_port: HttpPort,
    pub public_http_port: PublicHttpPort,
    pub certificate_bundles: CertificateBundles,
    pub user_agent: String,
    pub http_client_timeout: HttpClientTimeout,
    pub storage_backend: String,
    pub database_url: Option<String>,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let base_path = optional_env("CONFIG_BASE_PATH")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let domain: Domain = require_env("DOMAIN")?.try_into()?;
        let partner_base_url = EndpointUrl::parse("PARTNER_BASE_URL", &require_env("PARTNER_BASE_URL")?)?;
        let partner_token_url = EndpointUrl::parse(
            "PARTNER_TOKEN_URL",
            &default_env("PARTNER_TOKEN_URL", DEFAULT_PARTNER_TOKEN_URL),
        )?;
        let partner_authorize_url = EndpointUrl::parse(
            "PARTNER_AUTHORIZE_URL",
            &default_env("PARTNER_AUTHORIZE_URL", DEFAULT_PARTNER_AUTHORIZE_URL),
        )?;
        let client_id_path = resolve_path(&base_path, &require_env("CLIENT_ID_FILE")?);
        let client_secret_path = resolve_path(&base_path, &require_env("CLIENT_SECRET_FILE")?);
        let public_key_path = resolve_path(&base_path, &require_env("PUBLIC_KEY_FILE")?);
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let public_http_port: PublicHttpPort = optional_env("PUBLIC_HTTP_PORT").try_into()?;
        let certificate_bundles: CertificateBundles =
            optional_env("CERTIFICATE_BUNDLES").try_into()?;
        let http_client_timeout: HttpClientTimeout =
            default_env("HTTP_CLIENT_TIMEOUT", "10s").try_into()?;
        let default_user_agent = format!("nikola/{}", version()?);
        let user_agent = default_env("USER_AGENT", &default_user_agent);
        let storage_backend = default_env("STORAGE_BACKEND", DEFAULT_STORAGE_BACKEND);
        let database_url = optional_env("DATABASE_URL");

        Ok(Self {
            version: version()?,
            domain,
            partner_base_url,
            partner_token_url,
            partner_authorize_url,
            client_id_path,
            client_secret_path,
            public_key_path,
            http_port,
            public_http_port,
            certificate_bundles,
            user_agent,
            http_client_timeout,
            storage_backend,
            database_url,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

/// Relative paths are taken relative to `base_path`.
pub fn resolve_path(base_path: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_path.join(path)
    }
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<Option<String>> for PublicHttpPort {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.filter(|v| !v.trim().is_empty()) {
            None => Ok(Self(None)),
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map(|port| Self(Some(port)))
                .map_err(|err| ConfigError::PortParsingFailed(err).into()),
        }
    }
}

impl AsRef<Option<u16>> for PublicHttpPort {
    fn as_ref(&self) -> &Option<u16> {
        &self.0
    }
}

impl TryFrom<Option<String>> for CertificateBundles {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        let value = value.unwrap_or_default();
        Ok(Self(
            value
                .split(';')
                .filter_map(|s| {
                    if s.is_empty() {
                        None
                    } else {
                        Some(s.to_string())
                    }
                })
                .collect::<Vec<String>>(),
        ))
    }
}

impl TryFrom<String> for CertificateBundles {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(Some(value))
    }
}

impl AsRef<Vec<String>> for CertificateBundles {
    fn as_ref(&self) -> &Vec<String> {
        &self.0
    }
}

impl TryFrom<String> for HttpClientTimeout {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Self(Duration::from_secs(10)));
        }

        // Bare numbers are seconds; anything else goes through duration-str ("10s", "2m", "1m30s").
        if let Ok(seconds) = value.parse::<u64>() {
            return Ok(Self(Duration::from_secs(seconds)));
        }

        let duration = duration_str::parse(value)
            .map_err(|e| ConfigError::TimeoutParsingFailed(format!("{value}: {e}")))?;
        if duration.is_zero() {
            return Err(ConfigError::TimeoutParsingFailed(format!(
                "{value}: timeout must be greater than zero"
            )));
        }
        Ok(Self(duration))
    }
}

impl AsRef<Duration> for HttpClientTimeout {
    fn as_ref(&self) -> &Duration {
        &self.0
    }
}

impl EndpointUrl {
    /// Parse and validate an absolute http(s) URL; `name` is used in error messages.
    pub fn parse(name: &str, value: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(value.trim())
            .map_err(|e| ConfigError::InvalidUrl(name.to_string(), value.to_string(), e))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            _ => Err(ConfigError::UnsupportedUrlScheme(
                name.to_string(),
                value.to_string(),
            )),
        }
    }

    /// The URL with any trailing slash removed, suitable for appending paths.
    pub fn trimmed(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }
}

impl AsRef<Url> for EndpointUrl {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<String> for Domain {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.contains("://")
            || trimmed.contains('/')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::InvalidDomain(value));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<String> for Domain {
    fn as_ref(&self) -> &String {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_timeout_parsing() {
        let timeout: HttpClientTimeout = "10s".to_string().try_into().unwrap();
        assert_eq!(*timeout.as_ref(), Duration::from_secs(10));

        let timeout: HttpClientTimeout = "2m".to_string().try_into().unwrap();
        assert_eq!(*timeout.as_ref(), Duration::from_secs(120));

        let timeout: HttpClientTimeout = "7".to_string().try_into().unwrap();
        assert_eq!(*timeout.as_ref(), Duration::from_secs(7));

        let timeout: HttpClientTimeout = "".to_string().try_into().unwrap();
        assert_eq!(*timeout.as_ref(), Duration::from_secs(10));

        assert!(HttpClientTimeout::try_from("soon".to_string()).is_err());
        assert!(HttpClientTimeout::try_from("0s".to_string()).is_err());
    }

    #[test]
    fn test_public_http_port() {
        let port: PublicHttpPort = None::<String>.try_into().unwrap();
        assert_eq!(*port.as_ref(), None);

        let port: PublicHttpPort = Some("  ".to_string()).try_into().unwrap();
        assert_eq!(*port.as_ref(), None);

        let port: PublicHttpPort = Some("8443".to_string()).try_into().unwrap();
        assert_eq!(*port.as_ref(), Some(8443));

        assert!(PublicHttpPort::try_from(Some("http".to_string())).is_err());
    }

    #[test]
    fn test_endpoint_url_validation() {
        let url = EndpointUrl::parse("PARTNER_BASE_URL", "https://fleet.example.com/").unwrap();
        assert_eq!(url.trimmed(), "https://fleet.example.com");

        assert!(matches!(
            EndpointUrl::parse("PARTNER_BASE_URL", "not a url"),
            Err(ConfigError::InvalidUrl(..))
        ));
        assert!(matches!(
            EndpointUrl::parse("PARTNER_BASE_URL", "ftp://fleet.example.com"),
            Err(ConfigError::UnsupportedUrlScheme(..))
        ));
    }

    #[test]
    fn test_domain_validation() {
        let domain: Domain = " app.example.com ".to_string().try_into().unwrap();
        assert_eq!(domain.as_ref(), "app.example.com");

        assert!(Domain::try_from("".to_string()).is_err());
        assert!(Domain::try_from("https://app.example.com".to_string()).is_err());
        assert!(Domain::try_from("app.example.com/path".to_string()).is_err());
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/etc/nikola");
        assert_eq!(
            resolve_path(base, "secrets/client_id"),
            PathBuf::from("/etc/nikola/secrets/client_id")
        );
        assert_eq!(
            resolve_path(base, "/run/secrets/client_id"),
            PathBuf::from("/run/secrets/client_id")
        );
    }

    #[test]
    fn test_certificate_bundles() {
        let bundles: CertificateBundles = "a.pem;;b.pem".to_string().try_into().unwrap();
        assert_eq!(bundles.as_ref(), &vec!["a.pem".to_string(), "b.pem".to_string()]);

        let bundles: CertificateBundles = None::<String>.try_into().unwrap();
        assert!(bundles.as_ref().is_empty());
    }
}
