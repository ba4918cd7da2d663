//! Application and user registration against the partner platform.

pub mod service;
pub mod types;

pub use service::RegistrationService;
pub use types::{OAUTH_REDIRECT_PATH, PARTNER_ACCOUNTS_PATH, RegisteredUser};
