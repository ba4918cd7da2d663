//! Application state shared by the HTTP handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::registration::RegistrationService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Application and user registration
    pub registration_service: Arc<RegistrationService>,
}
