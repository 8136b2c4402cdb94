// ABOUTME: Two-tier Basic-Auth middleware: admin token for /api/*, guest token for /get/*.
// ABOUTME: The token travels in the Basic-Auth username; the password field is ignored.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use switchgate_store::Credentials;
use tower::{Layer, Service};

/// Which credential a path requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Admin,
    Guest,
    Open,
}

impl Access {
    /// Classify a request path by prefix.
    pub fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Access::Admin
        } else if path.starts_with("/get/") {
            Access::Guest
        } else {
            Access::Open
        }
    }
}

/// Extract `(username, password)` from an `Authorization: Basic ...` header.
pub fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Decide whether a request for `path` carrying `presented` may proceed.
pub fn is_authorized(credentials: &Credentials, path: &str, presented: Option<&str>) -> bool {
    match Access::for_path(path) {
        Access::Open => true,
        Access::Admin => presented == Some(credentials.admin()),
        Access::Guest => presented == Some(credentials.guest()),
    }
}

fn unauthorized() -> Response<Body> {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic")],
        "Authorization Required\n",
    )
        .into_response()
}

/// A tower Layer that applies token authentication to every route it wraps.
#[derive(Clone)]
pub struct AuthLayer {
    credentials: Arc<Credentials>,
}

impl AuthLayer {
    /// Create a new AuthLayer checking against the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            credentials: Arc::clone(&self.credentials),
        }
    }
}

/// The middleware service that checks tokens on /api/* and /get/* routes.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    credentials: Arc<Credentials>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path();
        tracing::debug!("{} {}", req.method(), path);

        let presented = basic_auth(req.headers()).map(|(token, _)| token);
        if is_authorized(&self.credentials, path, presented.as_deref()) {
            let mut inner = self.inner.clone();
            // Keep the instance that was driven to readiness.
            std::mem::swap(&mut self.inner, &mut inner);
            Box::pin(async move { inner.call(req).await })
        } else {
            tracing::info!("rejected {} {}: missing or wrong token", req.method(), path);
            Box::pin(async move { Ok(unauthorized()) })
        }
    }
}
