// ABOUTME: Browser-facing handlers: the rendered dashboard and raw static file passthrough.
// ABOUTME: Both are best-effort and never fail the request with a server error.

pub mod render;

use std::path::{Component, Path, PathBuf};

use axum::extract::State;
use axum::http::{Uri, header};
use axum::response::{Html, IntoResponse, Response};
use switchgate_core::aggregate;

use crate::app_state::SharedState;

/// GET / and /index.html - Render the dashboard from `public/index.html`.
pub async fn index_html(State(state): State<SharedState>) -> Html<String> {
    let index = aggregate(state.switcher.as_ref()).await;
    let file = state.public_dir.join("index.html");
    Html(render::render_or_report(&file, &index).await)
}

/// Map a request path onto the public directory. Anything that could escape it
/// (parent components, absolute prefixes) yields None.
pub fn public_path(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = public_dir.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if resolved == public_dir {
        return None;
    }
    Some(resolved)
}

/// GET /favicon.ico and /static/* - Serve a file from the public directory verbatim.
/// A missing file answers with the literal body `404` and a 200 status, which
/// existing clients rely on.
pub async fn pub_file(State(state): State<SharedState>, uri: Uri) -> Response {
    let Some(path) = public_path(&state.public_dir, uri.path()) else {
        tracing::warn!("refusing public path {}", uri.path());
        return "404".into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], contents).into_response()
        }
        Err(e) => {
            tracing::debug!("public file {}: {}", path.display(), e);
            "404".into_response()
        }
    }
}
