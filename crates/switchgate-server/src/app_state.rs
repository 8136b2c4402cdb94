// ABOUTME: Shared application state for the switchgate HTTP handlers.
// ABOUTME: Holds the switch engine handle, the public directory, and process start time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use switchgate_core::Switcher;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub switcher: Arc<dyn Switcher>,
    /// Directory holding `index.html` and the static files served verbatim.
    pub public_dir: PathBuf,
    pub started: Instant,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(switcher: Arc<dyn Switcher>, public_dir: PathBuf) -> Self {
        Self {
            switcher,
            public_dir,
            started: Instant::now(),
        }
    }
}
