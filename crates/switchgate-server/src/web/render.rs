// ABOUTME: Dashboard rendering via minijinja templates loaded from the public directory.
// ABOUTME: Injects prettyTime, prettyBytes and getIpAddr helpers; failures become diagnostic text.

use std::path::{Path, PathBuf};

use minijinja::Environment;
use serde::Serialize;
use switchgate_core::format::{ip_addr, pretty_bytes, pretty_time};
use thiserror::Error;

/// Errors that can occur while loading or rendering a dashboard template.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
}

/// Build a template environment with the dashboard helper functions registered.
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_function("prettyTime", |seconds: i64| pretty_time(seconds));
    env.add_function("prettyBytes", |bytes: u64| pretty_bytes(bytes));
    env.add_function("getIpAddr", |endpoint: String| ip_addr(&endpoint));
    env
}

/// Compile `source` as the template loaded from `path` and render it with `data`.
pub fn render_source<S: Serialize>(
    path: &Path,
    source: String,
    data: &S,
) -> Result<String, RenderError> {
    let to_template_err = |source: minijinja::Error| RenderError::Template {
        path: path.to_path_buf(),
        source,
    };

    // The name's extension decides auto-escaping.
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.html".to_string());

    let mut env = environment();
    env.add_template_owned(name.clone(), source)
        .map_err(to_template_err)?;
    env.get_template(&name)
        .map_err(to_template_err)?
        .render(data)
        .map_err(to_template_err)
}

/// Load the template at `path` and render it with `data` as context.
///
/// The file is read on every call so edits on disk show up on the next request.
pub async fn render_file<S: Serialize>(path: &Path, data: &S) -> Result<String, RenderError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RenderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    render_source(path, source, data)
}

/// Render the template, or describe what went wrong in place of the page.
pub async fn render_or_report<S: Serialize>(path: &Path, data: &S) -> String {
    match render_file(path, data).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!("dashboard render failed: {}", e);
            format!("template error: {e}")
        }
    }
}
