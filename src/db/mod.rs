use std::path::{Path, PathBuf};

use crate::core::models::{AccessRecord, AuthorizationRecord, RefreshRecord, SignInSession};
use crate::core::types::{Expire, TokenDigest};

mod table;

pub use table::Table;

pub const AUTHORIZATIONS_TABLE_FILE: &str = "authorizationsTable.json";
pub const REFRESH_TABLE_FILE: &str = "refreshTable.json";
pub const ACCESS_TABLE_FILE: &str = "accessTable.json";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access table file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("table file {path} is not valid JSON: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("a record is already stored under key {0:?}")]
    Collision(TokenDigest),
}

/// Key-value contract every table honors. Each call is atomic with respect
/// to the others on the same table.
#[async_trait::async_trait]
pub trait Store<R>: Send + Sync {
    async fn get(&self, key: &TokenDigest) -> Result<Option<R>, Error>;

    /// Stores `record` under a fresh key. Fails with [`Error::Collision`]
    /// instead of overwriting an existing record.
    async fn insert(&self, key: TokenDigest, record: R) -> Result<(), Error>;

    async fn delete(&self, key: &TokenDigest) -> Result<bool, Error>;

    /// Atomic get-and-delete. Of any number of concurrent callers at most
    /// one observes the record.
    async fn take(&self, key: &TokenDigest) -> Result<Option<R>, Error>;

    /// Drops every record for which `keep` returns false and returns how
    /// many were removed.
    async fn retain(&self, keep: &(dyn for<'r> Fn(&'r R) -> bool + Send + Sync)) -> Result<usize, Error>;

    async fn persist(&self) -> Result<(), Error>;
}

/// All protocol state: memory-only sign-in sessions plus the three token
/// tables.
#[derive(Debug)]
pub struct DbStore {
    pub sessions: Table<SignInSession>,
    pub codes: Table<AuthorizationRecord>,
    pub access: Table<AccessRecord>,
    pub refresh: Table<RefreshRecord>,
}

impl DbStore {
    pub fn in_memory() -> Self {
        Self {
            sessions: Table::in_memory(),
            codes: Table::in_memory(),
            access: Table::in_memory(),
            refresh: Table::in_memory(),
        }
    }

    /// Opens the token tables under `data_dir`. Missing files start empty.
    pub async fn open(data_dir: &Path) -> Result<Self, Error> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|source| Error::Io {
                path: data_dir.to_path_buf(),
                source,
            })?;

        Ok(Self {
            sessions: Table::in_memory(),
            codes: Table::open(data_dir.join(AUTHORIZATIONS_TABLE_FILE)).await?,
            access: Table::open(data_dir.join(ACCESS_TABLE_FILE)).await?,
            refresh: Table::open(data_dir.join(REFRESH_TABLE_FILE)).await?,
        })
    }

    pub async fn clean_up(&self) -> Result<usize, Error> {
        let sessions = self.sessions.retain(&|s: &SignInSession| !s.is_expired()).await?;
        let codes = self.codes.retain(&|r: &AuthorizationRecord| !r.is_expired()).await?;
        let access = self.access.retain(&|r: &AccessRecord| !r.is_expired()).await?;
        Ok(sessions + codes + access)
    }

    pub async fn persist(&self) -> Result<(), Error> {
        self.codes.persist().await?;
        self.access.persist().await?;
        self.refresh.persist().await
    }
}
