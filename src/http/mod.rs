//! Axum HTTP routers for the registration API and the public key endpoint.

pub mod context;
mod handler_registration;
pub mod server;

pub use context::AppState;
pub use server::{build_private_router, build_public_router, build_router};
