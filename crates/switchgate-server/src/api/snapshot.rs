// ABOUTME: Per-collection read-only endpoints registered through the ApiRoutes hook.
// ABOUTME: Admin routes list live collections; guest routes expose worker and version only.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use switchgate_core::Switcher;
use switchgate_core::aggregate::{
    collect_links, collect_neighbors, collect_network_clients, collect_networks, collect_online,
    collect_points, collect_states, unix_now as now,
};
use switchgate_core::schema::{
    EspState, Link, Neighbor, Network, OnLine, Point, Version, VpnClient, Worker,
};

use crate::api::ApiRoutes;

/// Registers read-only views of each live collection, sorted the same way the
/// index is.
pub struct SnapshotApi {
    switcher: Arc<dyn Switcher>,
}

type SwitchState = State<Arc<dyn Switcher>>;

impl SnapshotApi {
    pub fn new(switcher: Arc<dyn Switcher>) -> Self {
        Self { switcher }
    }
}

impl ApiRoutes for SnapshotApi {
    fn add_routes(&self, router: Router) -> Router {
        let api = Router::new()
            .route("/api/point", get(list_points))
            .route("/api/neighbor", get(list_neighbors))
            .route("/api/link", get(list_links))
            .route("/api/online", get(list_online))
            .route("/api/network", get(list_networks))
            .route("/api/network/{name}/client", get(list_network_clients))
            .route("/api/state", get(list_states))
            .route("/get/worker", get(get_worker))
            .route("/get/version", get(get_version))
            .with_state(Arc::clone(&self.switcher));
        router.merge(api)
    }
}

async fn list_points(State(switcher): SwitchState) -> Json<Vec<Point>> {
    Json(collect_points(switcher.as_ref(), now()).await)
}

async fn list_neighbors(State(switcher): SwitchState) -> Json<Vec<Neighbor>> {
    Json(collect_neighbors(switcher.as_ref(), now()).await)
}

async fn list_links(State(switcher): SwitchState) -> Json<Vec<Link>> {
    Json(collect_links(switcher.as_ref(), now()).await)
}

async fn list_online(State(switcher): SwitchState) -> Json<Vec<OnLine>> {
    Json(collect_online(switcher.as_ref(), now()).await)
}

async fn list_networks(State(switcher): SwitchState) -> Json<Vec<Network>> {
    Json(collect_networks(switcher.as_ref()).await)
}

async fn list_network_clients(
    State(switcher): SwitchState,
    Path(name): Path<String>,
) -> Json<Vec<VpnClient>> {
    Json(collect_network_clients(switcher.as_ref(), &name, now()).await)
}

async fn list_states(State(switcher): SwitchState) -> Json<Vec<EspState>> {
    Json(collect_states(switcher.as_ref(), now()).await)
}

async fn get_worker(State(switcher): SwitchState) -> Json<Worker> {
    Json(switcher.worker().await)
}

async fn get_version(State(switcher): SwitchState) -> Json<Version> {
    Json(switcher.version())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::Request;
    use switchgate_core::InMemorySwitch;
    use switchgate_core::live;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let switch = InMemorySwitch::new(Worker {
            uuid: "w-9".to_string(),
            ..Default::default()
        });
        switch
            .upsert_network(live::Network {
                name: "corp".to_string(),
                ..Default::default()
            })
            .await;
        for name in ["zed", "amy"] {
            switch
                .upsert_vpn_client(
                    "corp",
                    live::VpnClient {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
                .await;
        }
        for spi in [1, 9] {
            switch
                .upsert_esp_state(live::EspState {
                    spi,
                    ..Default::default()
                })
                .await;
        }

        SnapshotApi::new(Arc::new(switch)).add_routes(Router::new())
    }

    async fn get_json(router: Router, path: &str) -> serde_json::Value {
        let resp = router
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "GET {path}");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn network_clients_sorted_by_name() {
        let json = get_json(test_router().await, "/api/network/corp/client").await;
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();

        assert_eq!(names, vec!["amy", "zed"]);
    }

    #[tokio::test]
    async fn states_sorted_by_spi_descending() {
        let json = get_json(test_router().await, "/api/state").await;
        assert_eq!(json[0]["spi"], 9);
        assert_eq!(json[1]["spi"], 1);
    }

    #[tokio::test]
    async fn guest_routes_report_worker_and_version() {
        let worker = get_json(test_router().await, "/get/worker").await;
        assert_eq!(worker["uuid"], "w-9");

        let version = get_json(test_router().await, "/get/version").await;
        assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn empty_collections_are_empty_arrays() {
        let json = get_json(test_router().await, "/api/point").await;
        assert_eq!(json, serde_json::json!([]));
    }
}
