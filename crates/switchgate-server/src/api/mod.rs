// ABOUTME: JSON API: the built-in /api/index snapshot and the hook for externally registered routes.
// ABOUTME: External routes are added to the router before the auth layer wraps everything.

pub mod snapshot;

use axum::Json;
use axum::Router;
use axum::extract::State;
use switchgate_core::{Index, aggregate};

use crate::app_state::SharedState;

pub use snapshot::SnapshotApi;

/// Route-registration hook for the switch engine's own API.
///
/// Implementations add routes under `/api/` (admin) or `/get/` (guest); the
/// gateway applies the auth layer afterwards, so registered handlers never
/// see unauthenticated requests.
pub trait ApiRoutes: Send + Sync {
    fn add_routes(&self, router: Router) -> Router;
}

/// No external routes.
impl ApiRoutes for () {
    fn add_routes(&self, router: Router) -> Router {
        router
    }
}

/// GET /api/index - The full snapshot as JSON.
pub async fn get_index(State(state): State<SharedState>) -> Json<Index> {
    Json(aggregate(state.switcher.as_ref()).await)
}
