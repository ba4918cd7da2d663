//! Standardized error types following the `error-nikola-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-nikola-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when a port cannot be parsed
    #[error("error-nikola-config-2 Parsing port into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-nikola-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when HTTP client timeout cannot be parsed
    #[error("error-nikola-config-4 Failed to parse HTTP client timeout: {0}")]
    TimeoutParsingFailed(String),

    /// Error when a configured URL is not a valid absolute URL
    #[error("error-nikola-config-5 Invalid URL for {0} '{1}': {2}")]
    InvalidUrl(String, String, url::ParseError),

    /// Error when a configured URL is not http or https
    #[error("error-nikola-config-6 URL for {0} must use http or https: {1}")]
    UnsupportedUrlScheme(String, String),

    /// Error when the configured domain is empty or carries a scheme or path
    #[error("error-nikola-config-7 Invalid domain '{0}': expected a bare host name")]
    InvalidDomain(String),
}

/// Errors raised while reading the partner client credentials
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The credential file could not be read
    #[error("error-nikola-credential-1 Failed to read {0}: {1}")]
    ReadFailed(String, std::io::Error),

    /// The credential file was readable but held only whitespace
    #[error("error-nikola-credential-2 Credential file {0} is empty")]
    Empty(String),
}

/// Errors raised while acquiring a partner bearer token.
///
/// The enum is `Clone` so that the outcome of one refresh can be handed to
/// every caller that waited on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartnerTokenError {
    /// Client credentials could not be loaded
    #[error("error-nikola-token-1 Client credentials unavailable: {0}")]
    CredentialUnavailable(String),

    /// The token endpoint could not be reached or did not answer in time
    #[error("error-nikola-token-2 Token endpoint unreachable: {0}")]
    UpstreamUnreachable(String),

    /// The token endpoint answered with a non-success status
    #[error("error-nikola-token-3 Token endpoint rejected authentication with status {status}")]
    AuthenticationRejected { status: u16 },

    /// The issued token is not a bearer token
    #[error("error-nikola-token-4 Unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// The token endpoint response body could not be decoded
    #[error("error-nikola-token-5 Malformed token response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by the registration operations
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A partner token could not be obtained
    #[error(transparent)]
    Token(#[from] PartnerTokenError),

    /// The client identifier needed for the redirect URL could not be read
    #[error("error-nikola-registration-1 Client credentials unavailable: {0}")]
    CredentialUnavailable(#[from] CredentialError),

    /// The partner API refused or never answered the registration call
    #[error("error-nikola-registration-2 Partner registration failed (status {status:?}): {body}")]
    RegistrationFailed { status: Option<u16>, body: String },

    /// The user record store failed
    #[error("error-nikola-registration-3 Persistence failed: {0}")]
    PersistenceFailed(StorageError),

    /// The requested user does not exist
    #[error("error-nikola-registration-4 User not found: {0}")]
    NotFound(String),

    /// The supplied username is empty
    #[error("error-nikola-registration-5 Username must not be empty")]
    InvalidUsername,

    /// An outbound URL could not be constructed
    #[error("error-nikola-registration-6 Failed to build URL: {0}")]
    UrlConstruction(#[from] url::ParseError),
}

/// Database/storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-nikola-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when query execution fails
    #[error("error-nikola-storage-2 Query execution failed: {0}")]
    QueryFailed(String),

    /// Error when database operation fails
    #[error("error-nikola-storage-3 Database error: {0}")]
    DatabaseError(String),

    /// Error when data validation fails
    #[error("error-nikola-storage-4 Invalid data: {0}")]
    InvalidData(String),

    /// Error when requested resource is not found
    #[error("error-nikola-storage-5 Not found: {0}")]
    NotFound(String),

    /// The database reports a schema version this build does not know
    #[error("error-nikola-storage-6 Unknown schema version: {0}. Cannot continue.")]
    UnknownSchemaVersion(i64),

    /// Schema bootstrap did not converge on a known version
    #[error("error-nikola-storage-7 Schema bootstrap did not settle after {0} attempts")]
    MigrationStalled(usize),
}
