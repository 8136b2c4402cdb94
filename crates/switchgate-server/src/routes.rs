// ABOUTME: Route table for the gateway: dashboard, static files, diagnostics, JSON index, and external API routes.
// ABOUTME: The auth layer wraps the complete router, so routes registered through ApiRoutes are gated too.

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use switchgate_store::Credentials;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;

use crate::api::{self, ApiRoutes};
use crate::app_state::SharedState;
use crate::auth::AuthLayer;
use crate::{debug, web};

/// Per-request time limits.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Limit on receiving the request body.
    pub read: Duration,
    /// Limit on producing the complete response.
    pub write: Duration,
}

/// Build the gateway router.
///
/// `external` adds its routes before the layers are applied, so they are covered by
/// authentication, timeouts, and request tracing like the built-in ones.
pub fn create_router(
    state: SharedState,
    external: &dyn ApiRoutes,
    credentials: Credentials,
    timeouts: Timeouts,
) -> Router {
    let builtin = Router::new()
        .route("/", get(web::index_html))
        .route("/index.html", get(web::index_html))
        .route("/favicon.ico", get(web::pub_file))
        .route("/static/{*path}", get(web::pub_file))
        .route("/api/index", get(api::get_index));
    let builtin = debug::routes(builtin).with_state(state);

    external
        .add_routes(builtin)
        .layer(RequestBodyTimeoutLayer::new(timeouts.read))
        .layer(AuthLayer::new(credentials))
        .layer(TimeoutLayer::new(timeouts.write))
        .layer(TraceLayer::new_for_http())
}
