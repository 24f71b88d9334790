use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{event, Level};

use super::{Error, Store};
use crate::core::types::TokenDigest;

/// A whole-table JSON store. Every mutation is flushed before it becomes
/// visible in memory, so a failed write leaves both views unchanged.
pub struct Table<R> {
    path: Option<PathBuf>,
    records: Mutex<HashMap<TokenDigest, R>>,
}

impl<R> std::fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("path", &self.path).finish()
    }
}

impl<R> Table<R>
where
    R: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open(path: PathBuf) -> Result<Self, Error> {
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| Error::Serde {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(Error::Io { path, source }),
        };

        event!(
            Level::DEBUG,
            path = %path.display(),
            records = records.len(),
            "Opened table"
        );

        Ok(Self {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn mutate<T, F>(&self, records: &mut HashMap<TokenDigest, R>, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut HashMap<TokenDigest, R>) -> T + Send,
        T: Send,
    {
        match &self.path {
            None => Ok(f(records)),
            Some(path) => {
                let mut next = records.clone();
                let out = f(&mut next);
                write_table(path, &next).await?;
                *records = next;
                Ok(out)
            }
        }
    }
}

async fn write_table<R: Serialize>(path: &Path, records: &HashMap<TokenDigest, R>) -> Result<(), Error> {
    let bytes = serde_json::to_vec(records).map_err(|source| Error::Serde {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    let io_err = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}

#[async_trait::async_trait]
impl<R> Store<R> for Table<R>
where
    R: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &TokenDigest) -> Result<Option<R>, Error> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn insert(&self, key: TokenDigest, record: R) -> Result<(), Error> {
        let mut records = self.records.lock().await;
        if records.contains_key(&key) {
            event!(Level::ERROR, "Refusing to overwrite an existing record");
            return Err(Error::Collision(key));
        }
        self.mutate(&mut records, move |r| {
            r.insert(key, record);
        })
        .await
    }

    async fn delete(&self, key: &TokenDigest) -> Result<bool, Error> {
        let mut records = self.records.lock().await;
        if !records.contains_key(key) {
            return Ok(false);
        }
        self.mutate(&mut records, |r| r.remove(key).is_some()).await
    }

    async fn take(&self, key: &TokenDigest) -> Result<Option<R>, Error> {
        let mut records = self.records.lock().await;
        if !records.contains_key(key) {
            return Ok(None);
        }
        self.mutate(&mut records, |r| r.remove(key)).await
    }

    async fn retain(&self, keep: &(dyn for<'r> Fn(&'r R) -> bool + Send + Sync)) -> Result<usize, Error> {
        let mut records = self.records.lock().await;
        let before = records.len();
        if records.values().all(|r| keep(r)) {
            return Ok(0);
        }
        self.mutate(&mut records, |r| {
            r.retain(|_, v| keep(v));
            before - r.len()
        })
        .await
    }

    async fn persist(&self) -> Result<(), Error> {
        let records = self.records.lock().await;
        match &self.path {
            Some(path) => write_table(path, &records).await,
            None => Ok(()),
        }
    }
}
