use std::sync::Arc;

use prompter_relay::RelayService;

use crate::storage::Storage;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// The relay core: session registry, dispatch and broadcast.
    pub relay: Arc<RelayService>,
    /// User/interview persistence.
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(relay: Arc<RelayService>, storage: Arc<dyn Storage>) -> Self {
        Self { relay, storage }
    }
}
