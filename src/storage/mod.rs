use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageError;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Associative store the cache persists into.
///
/// No atomicity is offered across keys; each `set` is last-write-wins for its key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Key layout shared by every component that touches the store.
pub mod keys {
    use crate::models::TrackedItemId;

    pub const LIST_NAMES: &str = "listNames";
    pub const SELECTED_LIST: &str = "selectedList";

    const ITEM_PREFIX: &str = "item:";
    const LIST_PREFIX: &str = "list:";

    pub fn item(id: TrackedItemId) -> String {
        format!("{ITEM_PREFIX}{id}")
    }

    pub fn list(name: &str) -> String {
        format!("{LIST_PREFIX}{name}")
    }

    /// Keys the registry keeps for itself; list names may not shadow them.
    pub fn is_reserved(name: &str) -> bool {
        name == LIST_NAMES || name == SELECTED_LIST
    }
}

/// Reads and deserializes the value under `key`.
pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| StorageError::Corrupt {
                key: key.to_string(),
                reason: err.to_string(),
            }),
        None => Ok(None),
    }
}

/// Serializes `value` and writes it under `key`.
pub async fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Memory,
}

/// Opens the configured backend once at startup; everything downstream only sees the trait.
pub async fn open_store(
    backend: Backend,
    path: &Path,
) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    Ok(match backend {
        Backend::File => Arc::new(JsonFileStore::open(path).await?),
        Backend::Memory => Arc::new(MemoryStore::new()),
    })
}
