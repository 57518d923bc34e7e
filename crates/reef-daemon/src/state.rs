//! Shared runtime state for reef-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The store handle is
//! constructed once at process start and injected here — no module-global
//! connection state anywhere in the daemon.

use std::sync::Arc;

use reef_db::GameStore;
use serde::{Deserialize, Serialize};

/// Static build metadata included in the service banner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
pub struct AppState {
    /// Store contract; `PgStore` in production, `MemStore` in scenario tests.
    pub store: Arc<dyn GameStore>,
    /// Static build metadata.
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            build: BuildInfo {
                service: "reef-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
