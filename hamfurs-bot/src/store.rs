//! Keyed JSON document collections.
//!
//! A [`Collection`] keeps every document in memory behind an async lock and,
//! when opened from a path, rewrites the whole file on each mutation. Files
//! are replaced via a temp file + rename so a crash never leaves a half
//! written collection behind.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub const ALIASES: &str = "aliases";
pub const BOT_MESSAGES: &str = "bot_messages";
pub const CHATS: &str = "chats";
pub const DEFINITIONS: &str = "definitions";
pub const IC: &str = "ic";
pub const NKOM: &str = "nkom";
pub const DMR: &str = "dmr";
pub const VE_SESSIONS: &str = "ve_sessions";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Malformed collection file {path}: {error}")]
    Format {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}

pub struct Collection<T> {
    name: String,
    path: Option<PathBuf>,
    docs: RwLock<BTreeMap<String, T>>,
}

impl<T> Collection<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Collection that is never persisted.
    pub fn in_memory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_docs(name: &str, docs: impl IntoIterator<Item = (String, T)>) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            docs: RwLock::new(docs.into_iter().collect()),
        }
    }

    /// Open a file-backed collection. A missing file is an empty collection.
    pub async fn open(name: &str, path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let docs = read_file(&path).await?;
        tracing::debug!("Opened collection '{}' with {} documents", name, docs.len());
        Ok(Self {
            name: name.to_string(),
            path: Some(path),
            docs: RwLock::new(docs),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.docs.read().await.get(key).cloned()
    }

    /// First document (in key order) matching `predicate`.
    pub async fn find<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.docs.read().await.values().find(|&doc| predicate(doc)).cloned()
    }

    pub async fn values(&self) -> Vec<T> {
        self.docs.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    /// Apply `f` to a copy of the documents under the write lock.
    ///
    /// The copy replaces the in-memory documents only once it has been
    /// persisted, so a failed write leaves the collection unchanged.
    pub async fn update<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, T>) -> R,
    {
        let mut docs = self.docs.write().await;
        let mut staged = docs.clone();
        let result = f(&mut staged);
        self.persist(&staged).await?;
        *docs = staged;
        Ok(result)
    }

    /// Insert or replace; returns `true` when a document was replaced.
    pub async fn upsert(&self, key: impl Into<String>, doc: T) -> Result<bool, StoreError> {
        let key = key.into();
        self.update(|docs| docs.insert(key, doc).is_some()).await
    }

    pub async fn replace_all(&self, docs: BTreeMap<String, T>) -> Result<(), StoreError> {
        self.update(|current| *current = docs).await
    }

    /// Re-read the backing file, picking up out-of-band imports.
    pub async fn reload(&self) -> Result<usize, StoreError> {
        let Some(path) = &self.path else {
            return Ok(self.len().await);
        };
        let fresh = read_file(path).await?;
        let count = fresh.len();
        *self.docs.write().await = fresh;
        Ok(count)
    }

    async fn persist(&self, docs: &BTreeMap<String, T>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let body = serde_json::to_vec_pretty(docs).map_err(|error| StoreError::Format {
            path: path.clone(),
            error,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| io_error(parent, error))?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|error| io_error(&tmp, error))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|error| io_error(path, error))?;
        Ok(())
    }
}

async fn read_file<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(error) => return Err(io_error(path, error)),
    };
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&content).map_err(|error| StoreError::Format {
        path: path.to_path_buf(),
        error,
    })
}

fn io_error(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        error,
    }
}

/// A cache that can be refreshed from its backing file.
#[async_trait]
pub trait Reloadable: Send + Sync {
    fn name(&self) -> &str;
    async fn reload(&self) -> Result<usize, StoreError>;
}

#[async_trait]
impl<T> Reloadable for Collection<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn reload(&self) -> Result<usize, StoreError> {
        Collection::reload(self).await
    }
}
