// ABOUTME: HTTP gateway for switchgate, exposing live switch state as JSON and an HTML dashboard.
// ABOUTME: Uses Axum behind a two-tier Basic-Auth token layer, served by a retrying listener.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod debug;
pub mod gateway;
pub mod retry;
pub mod routes;
pub mod server;
pub mod web;

pub use api::{ApiRoutes, SnapshotApi};
pub use app_state::{AppState, SharedState};
pub use auth::AuthLayer;
pub use config::{ConfigError, GatewayConfig};
pub use gateway::Gateway;
pub use routes::{Timeouts, create_router};
pub use server::{HttpServer, LifecycleState, ServerError};
