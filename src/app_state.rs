use std::sync::Arc;

use crate::accounts::AccountService;
use crate::actor::{spawn_hub, HubHandle};

/// Application state, built once at startup and handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub accounts: Arc<dyn AccountService>,
}

impl AppState {
    /// Spawns the hub task, so this must run inside a tokio runtime.
    pub fn new(accounts: impl AccountService + 'static) -> Self {
        Self {
            hub: spawn_hub(),
            accounts: Arc::new(accounts),
        }
    }
}
