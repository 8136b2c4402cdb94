// ABOUTME: Startup orchestration: token load/save, router construction, and the listener lifecycle.
// ABOUTME: Credentials are fixed once initialization finishes and handed to the auth layer by value.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use switchgate_core::Switcher;
use switchgate_store::{Credentials, TokenStore};

use crate::api::ApiRoutes;
use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::routes::{Timeouts, create_router};
use crate::server::{HttpServer, LifecycleState};

/// The HTTP control-plane gateway in front of a switch engine.
pub struct Gateway {
    config: GatewayConfig,
    credentials: Credentials,
    router: Router,
    server: HttpServer,
}

impl Gateway {
    /// Prepare the gateway without binding anything.
    ///
    /// Loads the admin token from `config.token_file` (generating one if the file
    /// is missing), applies `token` when given, and saves the result back. Token
    /// file problems are logged and never fail initialization, and neither does
    /// a certificate without a key (or the reverse): that serves plain HTTP.
    pub fn initialize(
        config: GatewayConfig,
        switcher: Arc<dyn Switcher>,
        api: &dyn ApiRoutes,
        token: Option<String>,
    ) -> Self {
        if config.tls_is_partial() {
            tracing::warn!(
                "TLS needs both a certificate and a key; serving plain HTTP on {}",
                config.listen
            );
        }

        let mut store = TokenStore::new(config.token_file.clone());
        store.load();
        if let Some(token) = token {
            tracing::info!("using admin token from the command line");
            store.set_token(token);
        }
        store.save();
        let credentials = store.credentials();

        let state = Arc::new(AppState::new(switcher, config.public_dir.clone()));
        let timeouts = Timeouts {
            read: config.read_timeout,
            write: config.write_timeout,
        };
        let router = create_router(state, api, credentials.clone(), timeouts);
        let server = HttpServer::new(config.clone(), router.clone());

        Self {
            config,
            credentials,
            router,
            server,
        }
    }

    /// Spawn the listener in the background and return without waiting for it to bind.
    pub async fn start(&self) {
        tracing::info!(
            "starting gateway on {} ({})",
            self.config.listen,
            if self.config.tls().is_some() { "tls" } else { "plain" }
        );
        self.server.start().await;
    }

    /// Stop the listener gracefully; in-flight requests are allowed to finish.
    pub async fn shutdown(&self) {
        self.server.shutdown().await;
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn token_file(&self) -> &Path {
        &self.config.token_file
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The fully layered router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn server(&self) -> &HttpServer {
        &self.server
    }

    pub fn state(&self) -> LifecycleState {
        self.server.state()
    }
}
