// ABOUTME: Listener lifecycle: binds plain HTTP or TLS, retries failures in the background, shuts down gracefully.
// ABOUTME: State moves Stopped -> Starting -> Serving -> ShuttingDown -> Stopped and can be observed via a watch channel.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::retry::{Backoff, retry_until_stopped};

/// Errors from a single bind-and-serve attempt. All of them are retried.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to serve on {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load TLS certificate {cert} / key {key}: {source}")]
    Tls {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Serving,
    ShuttingDown,
}

/// The axum-server handle of the current attempt.
///
/// A handle reports its bind outcome once, so every attempt installs a fresh
/// one. Shutdown signals whichever handle is installed.
type HandleSlot = Arc<std::sync::Mutex<Handle>>;

fn current(slot: &HandleSlot) -> Handle {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

struct Running {
    handle: HandleSlot,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the listener for one router.
pub struct HttpServer {
    config: GatewayConfig,
    router: Router,
    state: Arc<watch::Sender<LifecycleState>>,
    running: Mutex<Option<Running>>,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, router: Router) -> Self {
        let (state, _) = watch::channel(LifecycleState::Stopped);
        Self {
            config,
            router,
            state: Arc::new(state),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Spawn the retrying listener and return immediately.
    ///
    /// Calling this while the listener is already running does nothing.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::warn!("listener on {} already started", self.config.listen);
            return;
        }

        let handle: HandleSlot = Arc::new(std::sync::Mutex::new(Handle::new()));
        let (cancel, cancel_rx) = watch::channel(false);
        self.state.send_replace(LifecycleState::Starting);

        let config = self.config.clone();
        let router = self.router.clone();
        let state = Arc::clone(&self.state);
        let slot = Arc::clone(&handle);

        let task = tokio::spawn(async move {
            let attempts = retry_until_stopped(Backoff::default(), cancel_rx.clone(), |attempt| {
                serve_attempt(
                    config.clone(),
                    router.clone(),
                    Arc::clone(&slot),
                    cancel_rx.clone(),
                    Arc::clone(&state),
                    attempt,
                )
            })
            .await;
            tracing::info!("listener closed after {} attempt(s)", attempts);
        });

        *running = Some(Running {
            handle,
            cancel,
            task,
        });
    }

    /// Resolve to the bound address once serving, or None if the listener
    /// stopped (or was never started) before binding.
    pub async fn listening(&self) -> Option<SocketAddr> {
        let slot = Arc::clone(&self.running.lock().await.as_ref()?.handle);
        let mut rx = self.state.subscribe();
        let reached = rx
            .wait_for(|s| *s != LifecycleState::Starting)
            .await
            .ok()
            .map(|s| *s)?;
        if reached != LifecycleState::Serving {
            return None;
        }
        current(&slot).listening().await
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    ///
    /// Pending bind retries are cancelled as well. Failures are logged only.
    pub async fn shutdown(&self) {
        let Some(running) = self.running.lock().await.take() else {
            tracing::debug!("shutdown requested but listener is not running");
            return;
        };

        self.state.send_replace(LifecycleState::ShuttingDown);
        if running.cancel.send(true).is_err() {
            tracing::debug!("retry loop already finished");
        }
        current(&running.handle).graceful_shutdown(None);

        if let Err(e) = running.task.await {
            tracing::error!("listener task on {} failed: {}", self.config.listen, e);
        }
        self.state.send_replace(LifecycleState::Stopped);
        tracing::info!("listener on {} stopped", self.config.listen);
    }
}

async fn serve_attempt(
    config: GatewayConfig,
    router: Router,
    slot: HandleSlot,
    cancel: watch::Receiver<bool>,
    state: Arc<watch::Sender<LifecycleState>>,
    attempt: u32,
) -> Result<(), ServerError> {
    state.send_if_modified(|s| {
        let changed = *s == LifecycleState::Serving;
        if changed {
            *s = LifecycleState::Starting;
        }
        changed
    });

    // Installed under the lock so a concurrent shutdown either sees this
    // handle or has already set the cancel flag.
    let handle = {
        let mut installed = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if *cancel.borrow() {
            return Ok(());
        }
        *installed = Handle::new();
        installed.clone()
    };

    let serve = serve_once(&config, router, handle.clone());
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => return result,
        addr = handle.listening() => {
            if let Some(addr) = addr {
                state.send_if_modified(|s| {
                    let changed = *s == LifecycleState::Starting;
                    if changed {
                        *s = LifecycleState::Serving;
                    }
                    changed
                });
                let scheme = if config.tls().is_some() { "https" } else { "http" };
                tracing::info!("serving {}://{} (attempt {})", scheme, addr, attempt);
            }
        }
    }

    serve.await
}

async fn serve_once(
    config: &GatewayConfig,
    router: Router,
    handle: Handle,
) -> Result<(), ServerError> {
    let addr = config.listen;
    let app = router.into_make_service();
    let served = match config.tls() {
        None => axum_server::bind(addr).handle(handle).serve(app).await,
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key)
                .await
                .map_err(|source| ServerError::Tls {
                    cert: cert.clone(),
                    key: key.clone(),
                    source,
                })?;
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app)
                .await
        }
    };
    served.map_err(|source| ServerError::Serve { addr, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::time::Duration;

    fn local_config(listen: SocketAddr) -> GatewayConfig {
        GatewayConfig {
            listen,
            ..GatewayConfig::default()
        }
    }

    fn ping_router() -> Router {
        Router::new().route("/ping", get(|| async { "pong" }))
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let server = HttpServer::new(local_config("127.0.0.1:0".parse().unwrap()), ping_router());
        assert_eq!(server.state(), LifecycleState::Stopped);

        server.start().await;
        let addr = tokio::time::timeout(Duration::from_secs(5), server.listening())
            .await
            .unwrap()
            .expect("listener should bind");
        assert_eq!(server.state(), LifecycleState::Serving);

        let body = reqwest::get(format!("http://{addr}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        server.shutdown().await;
        assert_eq!(server.state(), LifecycleState::Stopped);
        assert!(reqwest::get(format!("http://{addr}/ping")).await.is_err());
    }

    #[tokio::test]
    async fn start_twice_keeps_one_listener() {
        let server = HttpServer::new(local_config("127.0.0.1:0".parse().unwrap()), ping_router());
        server.start().await;
        let first = server.listening().await;
        server.start().await;
        assert_eq!(server.listening().await, first);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_retries() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = occupied.local_addr().unwrap();

        let server = HttpServer::new(local_config(addr), ping_router());
        server.start().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(server.state(), LifecycleState::Starting);

        tokio::time::timeout(Duration::from_secs(5), server.shutdown())
            .await
            .expect("shutdown should not wait for the next retry");
        assert_eq!(server.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn binds_once_the_port_is_freed() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = occupied.local_addr().unwrap();
        let started = std::time::Instant::now();

        let server = HttpServer::new(local_config(addr), ping_router());
        server.start().await;

        // Attempts at 0s and 2s both hit the occupied port.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(server.state(), LifecycleState::Starting);
        drop(occupied);

        let bound = tokio::time::timeout(Duration::from_secs(20), server.listening())
            .await
            .expect("third attempt should bind");
        assert_eq!(bound, Some(addr));
        assert!(started.elapsed() >= Duration::from_secs(12));
        assert_eq!(server.state(), LifecycleState::Serving);

        server.shutdown().await;
    }

    fn tls_config(dir: &tempfile::TempDir) -> GatewayConfig {
        GatewayConfig {
            cert_file: Some(dir.path().join("missing-cert.pem")),
            key_file: Some(dir.path().join("missing-key.pem")),
            ..local_config("127.0.0.1:0".parse().unwrap())
        }
    }

    #[tokio::test]
    async fn tls_attempt_reports_missing_material() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = tls_config(&dir);

        let err = serve_once(&config, ping_router(), Handle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Tls { .. }), "{err}");
        assert!(err.to_string().contains("missing-cert.pem"));
    }

    #[tokio::test]
    async fn missing_tls_material_is_retried_not_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let server = HttpServer::new(tls_config(&dir), ping_router());
        server.start().await;

        // Long enough for the first retry at 2s.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(server.state(), LifecycleState::Starting);

        tokio::time::timeout(Duration::from_secs(5), server.shutdown())
            .await
            .expect("shutdown should not wait for the next retry");
        assert_eq!(server.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn listening_without_start_is_none() {
        let server = HttpServer::new(GatewayConfig::default(), ping_router());
        assert_eq!(server.listening().await, None);
        server.shutdown().await;
        assert_eq!(server.state(), LifecycleState::Stopped);
    }
}
