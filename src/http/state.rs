//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::config::GlobalConfig;
use crate::sender::BatchSender;
use crate::store::JobStore;

/// Shared application state accessible by all HTTP handlers.
///
/// Owned by the composition root and handed to the router as an `Arc`;
/// the store inside is the process's only mutable shared resource.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// The job registry.
    pub store: Arc<JobStore>,
    /// Batch send orchestrator wired to its collaborators.
    pub sender: Arc<BatchSender>,
}
