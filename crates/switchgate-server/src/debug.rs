// ABOUTME: Diagnostic endpoints under /debug/pprof/ for inspecting the running gateway.
// ABOUTME: Exposes the command line, tokio runtime counters, and build metadata.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde::Serialize;
use switchgate_core::schema::Version;

use crate::app_state::SharedState;

/// Runtime counters reported by /debug/pprof/runtime.
#[derive(Debug, Serialize)]
pub struct RuntimeReport {
    pub workers: usize,
    pub alive_tasks: usize,
    pub uptime_secs: u64,
    pub pid: u32,
}

/// Add the diagnostic routes to `router`.
pub fn routes(router: Router<SharedState>) -> Router<SharedState> {
    router
        .route("/debug/pprof/", get(index))
        .route("/debug/pprof/cmdline", get(cmdline))
        .route("/debug/pprof/runtime", get(runtime))
        .route("/debug/pprof/build", get(build))
}

/// GET /debug/pprof/ - List the available diagnostics.
async fn index() -> Html<&'static str> {
    Html(concat!(
        "<html><head><title>/debug/pprof/</title></head><body>\n",
        "<p>/debug/pprof/</p>\n",
        "<ul>\n",
        "<li><a href=\"cmdline\">cmdline</a>: the command line of the running process</li>\n",
        "<li><a href=\"runtime\">runtime</a>: async runtime worker and task counts</li>\n",
        "<li><a href=\"build\">build</a>: version, build date, and commit</li>\n",
        "</ul>\n",
        "</body></html>\n",
    ))
}

/// GET /debug/pprof/cmdline - Process arguments separated by NUL bytes.
async fn cmdline() -> String {
    std::env::args().collect::<Vec<_>>().join("\0")
}

/// GET /debug/pprof/runtime - Tokio runtime counters and process uptime.
async fn runtime(State(state): State<SharedState>) -> Json<RuntimeReport> {
    let metrics = tokio::runtime::Handle::current().metrics();
    Json(RuntimeReport {
        workers: metrics.num_workers(),
        alive_tasks: metrics.num_alive_tasks(),
        uptime_secs: state.started.elapsed().as_secs(),
        pid: std::process::id(),
    })
}

/// GET /debug/pprof/build - Build metadata.
async fn build(State(state): State<SharedState>) -> Json<Version> {
    Json(state.switcher.version())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use http::Request;
    use switchgate_core::InMemorySwitch;
    use switchgate_core::schema::Worker;
    use tower::ServiceExt;

    use crate::app_state::AppState;

    fn test_router() -> Router {
        let state = Arc::new(AppState::new(
            Arc::new(InMemorySwitch::new(Worker::default())),
            PathBuf::from("public"),
        ));
        routes(Router::new()).with_state(state)
    }

    async fn body_of(path: &str) -> (u16, String) {
        let resp = test_router()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_links_every_diagnostic() {
        let (status, body) = body_of("/debug/pprof/").await;
        assert_eq!(status, 200);
        for name in ["cmdline", "runtime", "build"] {
            assert!(body.contains(name), "index should list {name}");
        }
    }

    #[tokio::test]
    async fn runtime_reports_workers() {
        let (status, body) = body_of("/debug/pprof/runtime").await;
        assert_eq!(status, 200);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["workers"].as_u64().unwrap() >= 1);
        assert_eq!(json["pid"].as_u64().unwrap(), u64::from(std::process::id()));
    }

    #[tokio::test]
    async fn build_reports_version() {
        let (_, body) = body_of("/debug/pprof/build").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn cmdline_is_not_empty() {
        let (status, body) = body_of("/debug/pprof/cmdline").await;
        assert_eq!(status, 200);
        assert!(!body.is_empty());
    }
}
