use std::time::Duration;

use crate::core::models::{ClientCredential, Credentials};
use crate::core::types::ClientId;
use crate::db::DbStore;
use crate::util::hash::HashingService;

use tracing::{event, Level};

pub mod access_token;
pub mod authorization;
pub mod error;
pub mod session;
pub mod validation;

pub use error::Error;

pub const DEFAULT_AUTH_CODE_LIFETIME: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetimes {
    pub auth_code: Duration,
    pub access_token: Duration,
    /// How long a sign-in session waits for its login.
    pub session: Duration,
}

impl Default for Lifetimes {
    fn default() -> Self {
        Self {
            auth_code: DEFAULT_AUTH_CODE_LIFETIME,
            access_token: DEFAULT_ACCESS_TOKEN_LIFETIME,
            session: DEFAULT_SESSION_LIFETIME,
        }
    }
}

#[derive(Debug)]
pub struct OAuth2Provider {
    client: ClientCredential,
    credentials: Credentials,
    store: DbStore,
    hasher: HashingService,
    lifetimes: Lifetimes,
}

impl OAuth2Provider {
    pub fn new(
        client: ClientCredential,
        credentials: Credentials,
        store: DbStore,
        hasher: HashingService,
        lifetimes: Lifetimes,
    ) -> Self {
        Self {
            client,
            credentials,
            store,
            hasher,
            lifetimes,
        }
    }

    pub fn client(&self) -> &ClientCredential {
        &self.client
    }

    pub fn store(&self) -> &DbStore {
        &self.store
    }

    pub fn lifetimes(&self) -> Lifetimes {
        self.lifetimes
    }

    /// Records minted for any other client are never honored.
    fn is_registered_client(&self, client_id: &ClientId) -> bool {
        if client_id == &self.client.id {
            true
        } else {
            event!(
                Level::WARN,
                record_client_id = %client_id,
                "Record belongs to an unknown client"
            );
            false
        }
    }

    pub async fn start_clean_up_worker(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            match self.store.clean_up().await {
                Ok(0) => {}
                Ok(removed) => event!(Level::DEBUG, removed, "Purged expired records"),
                Err(e) => event!(Level::ERROR, error = %e, "Clean up failed"),
            }
        }
    }
}
