//! Shared application state for all routes.

use crate::service::DataAdapter;

#[derive(Clone)]
pub struct AppState {
    pub adapter: DataAdapter,
    /// Upper bound on JSON request bodies.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(adapter: DataAdapter) -> Self {
        Self {
            adapter,
            max_body_bytes: crate::settings::DEFAULT_MAX_BODY_BYTES,
        }
    }
}
