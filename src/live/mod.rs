//! Live quiz session engine: a host-paced, multi-player game over one
//! socket group per join code.

mod error;
pub mod hub;
pub mod ledger;
pub mod protocol;
pub mod ranking;
pub mod roster;
pub mod sequencer;

use std::sync::Arc;

pub use error::LiveError;
pub use hub::Hub;
pub use protocol::Connection;

use crate::{config::LiveSettings, store::LiveStore};

/// Shared handles every live connection works against. Cheap to clone.
#[derive(Clone)]
pub struct LiveEngine {
    store: Arc<dyn LiveStore>,
    hub: Arc<Hub>,
    settings: LiveSettings,
    secret: Arc<str>,
}

impl LiveEngine {
    pub fn new(store: Arc<dyn LiveStore>, settings: LiveSettings, secret: &str) -> Self {
        Self {
            store,
            hub: Arc::new(Hub::new()),
            settings,
            secret: Arc::from(secret),
        }
    }

    pub fn store(&self) -> &dyn LiveStore {
        self.store.as_ref()
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }

    /// Key used to sign and check host tokens.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}
