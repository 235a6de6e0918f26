use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Result, TrackerError};
use crate::storage::{self, KeyValueStore, keys};
use crate::watch_list::{MergeReport, WatchList};

pub const DEFAULT_LIST_NAME: &str = "default";

/// Registry state that outlives a session: which list is active, and which one is protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryState {
    pub default_list: String,
    pub selected: String,
}

/// Set of named watch lists.
///
/// The name index (`listNames`) holds every list except the default one, which always exists
/// implicitly and cannot be deleted or renamed.
pub struct WatchListRegistry {
    store: Arc<dyn KeyValueStore>,
    state: RegistryState,
}

impl WatchListRegistry {
    /// Restores the registry, falling back to the default list when the persisted selection
    /// no longer exists.
    pub async fn open(store: Arc<dyn KeyValueStore>, default_list: impl Into<String>) -> Result<Self> {
        let default_list = default_list.into();
        let persisted: Option<String> = storage::load(store.as_ref(), keys::SELECTED_LIST).await?;

        let mut registry = Self {
            store,
            state: RegistryState {
                selected: default_list.clone(),
                default_list,
            },
        };

        if let Some(name) = persisted {
            if registry.is_registered(&name).await? {
                registry.state.selected = name;
            } else {
                warn!(list = %name, "selected list no longer exists, using default");
            }
        }

        Ok(registry)
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn default_list(&self) -> &str {
        &self.state.default_list
    }

    pub fn selected(&self) -> &str {
        &self.state.selected
    }

    /// Every list name, default first, then in creation order.
    pub async fn list_names(&self) -> Result<Vec<String>> {
        let mut names = vec![self.state.default_list.clone()];
        names.extend(self.index().await?);
        Ok(names)
    }

    pub async fn is_registered(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        Ok(name == self.state.default_list || self.index().await?.iter().any(|n| n == name))
    }

    pub async fn create(&self, name: &str) -> Result<WatchList> {
        let name = self.validate_name(name)?;
        if self.is_registered(&name).await? {
            return Err(TrackerError::DuplicateName(name));
        }

        let list = WatchList::new(&name);
        list.save(self.kv()).await?;

        let mut index = self.index().await?;
        index.push(name.clone());
        self.save_index(&index).await?;

        info!(list = %name, "list created");
        Ok(list)
    }

    /// Deletes a list. Cached item records are left alone.
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name == self.state.default_list {
            return Err(TrackerError::ProtectedList(name.to_string()));
        }

        let mut index = self.index().await?;
        let Some(position) = index.iter().position(|n| n == name) else {
            return Err(TrackerError::UnknownList(name.to_string()));
        };

        self.kv().remove(&keys::list(name)).await?;
        index.remove(position);
        self.save_index(&index).await?;

        if self.state.selected == name {
            let default_list = self.state.default_list.clone();
            self.persist_selection(default_list).await?;
        }

        info!(list = %name, "list deleted");
        Ok(())
    }

    pub async fn select(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if !self.is_registered(name).await? {
            return Err(TrackerError::UnknownList(name.to_string()));
        }
        self.persist_selection(name.to_string()).await
    }

    /// Loads a list by name, registering it on first reference.
    pub async fn open_list(&self, name: &str) -> Result<WatchList> {
        let name = name.trim();
        if self.is_registered(name).await? {
            return WatchList::load(self.kv(), name).await;
        }
        self.create(name).await
    }

    pub async fn selected_list(&self) -> Result<WatchList> {
        WatchList::load(self.kv(), &self.state.selected).await
    }

    /// Renames a list, keeping its position in the index and its selection.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<WatchList> {
        let from = from.trim();
        if from == self.state.default_list {
            return Err(TrackerError::ProtectedList(from.to_string()));
        }

        let mut index = self.index().await?;
        let Some(position) = index.iter().position(|n| n == from) else {
            return Err(TrackerError::UnknownList(from.to_string()));
        };

        let to = self.validate_name(to)?;
        if self.is_registered(&to).await? {
            return Err(TrackerError::DuplicateName(to));
        }

        let mut list = WatchList::load(self.kv(), from).await?;
        list.set_name(&to);
        list.save(self.kv()).await?;
        self.kv().remove(&keys::list(from)).await?;

        index[position] = to.clone();
        self.save_index(&index).await?;

        if self.state.selected == from {
            self.persist_selection(to.clone()).await?;
        }

        info!(from = %from, to = %to, "list renamed");
        Ok(list)
    }

    /// Copies the members of `source` into `target`, skipping ones it already has.
    pub async fn merge(&self, source: &str, target: &str) -> Result<MergeReport> {
        let (source, target) = (source.trim(), target.trim());
        for name in [source, target] {
            if !self.is_registered(name).await? {
                return Err(TrackerError::UnknownList(name.to_string()));
            }
        }

        let source_list = WatchList::load(self.kv(), source).await?;
        let mut target_list = WatchList::load(self.kv(), target).await?;

        let report = if source == target {
            MergeReport {
                added: 0,
                duplicates: source_list.len(),
            }
        } else {
            target_list.merge_from(&source_list)
        };
        target_list.save(self.kv()).await?;

        info!(
            source = %source,
            target = %target,
            added = report.added,
            duplicates = report.duplicates,
            "lists merged"
        );
        Ok(report)
    }

    fn kv(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn validate_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::InvalidName(name.to_string()));
        }
        if keys::is_reserved(name) {
            return Err(TrackerError::ReservedName(name.to_string()));
        }
        Ok(name.to_string())
    }

    async fn index(&self) -> Result<Vec<String>> {
        let names: Vec<String> = storage::load(self.kv(), keys::LIST_NAMES)
            .await?
            .unwrap_or_default();

        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if name != self.state.default_list && !unique.contains(&name) {
                unique.push(name);
            }
        }
        Ok(unique)
    }

    async fn save_index(&self, names: &[String]) -> Result<()> {
        storage::save(self.kv(), keys::LIST_NAMES, names).await?;
        Ok(())
    }

    async fn persist_selection(&mut self, name: String) -> Result<()> {
        storage::save(self.kv(), keys::SELECTED_LIST, &name).await?;
        info!(list = %name, "list selected");
        self.state.selected = name;
        Ok(())
    }
}
