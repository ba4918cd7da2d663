//! Router configuration for the private registration API and the public key endpoint.

use axum::{
    Router,
    routing::{delete, post},
};
use tower_http::{services::ServeFile, trace::TraceLayer};

use super::{
    context::AppState,
    handler_registration::{
        delete_user_handler, register_application_handler, register_user_handler,
    },
};
use crate::config::{Config, PUBLIC_KEY_WELL_KNOWN_PATH};

/// Registration API, meant for operators only
pub fn build_private_router(ctx: AppState) -> Router {
    let registration_routes = Router::new()
        .route("/application", post(register_application_handler))
        .route("/users", post(register_user_handler))
        .route("/users/{user_id}", delete(delete_user_handler));

    Router::new()
        .nest("/api/registration", registration_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Serves the public key the partner fetches to verify this domain
pub fn build_public_router(config: &Config) -> Router {
    Router::new()
        .route_service(
            PUBLIC_KEY_WELL_KNOWN_PATH,
            ServeFile::new(&config.public_key_path),
        )
        .layer(TraceLayer::new_for_http())
}

/// Both routers on a single listener
pub fn build_router(ctx: AppState) -> Router {
    let public = build_public_router(&ctx.config);
    build_private_router(ctx).merge(public)
}
