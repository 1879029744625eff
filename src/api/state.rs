//! Application state for the API server

use crate::ParaphraseWorker;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; the worker is reference counted inside.
#[derive(Clone)]
pub struct AppState {
    /// The worker processing uploads
    pub worker: ParaphraseWorker,
}

impl AppState {
    /// Create a new AppState
    pub fn new(worker: ParaphraseWorker) -> Self {
        Self { worker }
    }
}
