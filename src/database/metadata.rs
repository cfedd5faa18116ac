// file: src/database/metadata.rs
// description: persistent storage for users, datasets, data records and search history
// reference: json file persistence with an in-memory cache

use crate::error::{MemoryError, Result};
use crate::models::{Data, DataStatus, Dataset, SearchHistoryEntry, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MetadataState {
    users: BTreeMap<Uuid, User>,
    datasets: BTreeMap<Uuid, Dataset>,
    data: BTreeMap<Uuid, Data>,
    history: Vec<SearchHistoryEntry>,
}

pub struct MetadataStore {
    storage_path: PathBuf,
    state: MetadataState,
}

impl MetadataStore {
    pub async fn open(storage_path: PathBuf) -> Result<Self> {
        let mut store = Self {
            storage_path,
            state: MetadataState::default(),
        };

        store.load().await?;

        Ok(store)
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub async fn load(&mut self) -> Result<()> {
        if !fs::try_exists(&self.storage_path).await.unwrap_or(false) {
            debug!("No existing metadata file found at {:?}", self.storage_path);
            return Ok(());
        }

        let contents = fs::read_to_string(&self.storage_path)
            .await
            .map_err(|e| MemoryError::file(&self.storage_path, e))?;

        self.state = serde_json::from_str(&contents).map_err(|e| {
            MemoryError::Serialization(format!("Failed to parse metadata: {}", e))
        })?;

        info!(
            "Loaded metadata: {} datasets, {} data items, {} history entries",
            self.state.datasets.len(),
            self.state.data.len(),
            self.state.history.len()
        );
        Ok(())
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::file(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(&self.state)?;

        fs::write(&self.storage_path, contents)
            .await
            .map_err(|e| MemoryError::file(&self.storage_path, e))?;

        debug!("Saved metadata to {:?}", self.storage_path);
        Ok(())
    }

    /// Drops all state and removes the backing file.
    pub async fn clear(&mut self) -> Result<()> {
        self.state = MetadataState::default();
        if fs::try_exists(&self.storage_path).await.unwrap_or(false) {
            fs::remove_file(&self.storage_path)
                .await
                .map_err(|e| MemoryError::file(&self.storage_path, e))?;
        }
        info!("Cleared metadata store at {:?}", self.storage_path);
        Ok(())
    }

    pub async fn get_or_create_user(&mut self, email: &str) -> Result<User> {
        if let Some(user) = self.state.users.values().find(|u| u.email == email) {
            return Ok(user.clone());
        }

        let user = User::new(email);
        self.state.users.insert(user.id, user.clone());
        self.save().await?;
        info!("Created user {}", email);
        Ok(user)
    }

    pub fn get_user(&self, id: &Uuid) -> Option<&User> {
        self.state.users.get(id)
    }

    pub fn get_dataset_by_name(&self, owner_id: &Uuid, name: &str) -> Option<&Dataset> {
        self.state
            .datasets
            .get(&Dataset::derive_id(owner_id, name))
    }

    pub fn list_datasets(&self, owner_id: &Uuid) -> Vec<Dataset> {
        self.state
            .datasets
            .values()
            .filter(|d| &d.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn ensure_dataset(&mut self, owner_id: Uuid, name: &str) -> Dataset {
        self.state
            .datasets
            .entry(Dataset::derive_id(&owner_id, name))
            .or_insert_with(|| Dataset::new(name, owner_id))
            .clone()
    }

    /// Registers `data` in the dataset. Existing rows keep their id and merge node sets;
    /// a row whose node set grew is queued for processing again.
    pub fn upsert_data(&mut self, dataset_id: &Uuid, data: Data) -> Result<Data> {
        let stored = match self.state.data.get_mut(&data.id) {
            Some(existing) => {
                if existing.merge_node_set(&data.node_set) {
                    existing.set_status(DataStatus::Pending);
                }
                existing.raw_data_location = data.raw_data_location;
                existing.clone()
            }
            None => {
                self.state.data.insert(data.id, data.clone());
                data
            }
        };

        let dataset = self
            .state
            .datasets
            .get_mut(dataset_id)
            .ok_or_else(|| MemoryError::DatasetNotFound(dataset_id.to_string()))?;
        dataset.link(stored.id);

        Ok(stored)
    }

    pub fn dataset_data(&self, dataset_id: &Uuid) -> Vec<Data> {
        self.state
            .datasets
            .get(dataset_id)
            .map(|dataset| {
                dataset
                    .data_ids
                    .iter()
                    .filter_map(|id| self.state.data.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_data_status(&mut self, data_id: &Uuid, status: DataStatus) {
        if let Some(data) = self.state.data.get_mut(data_id) {
            data.set_status(status);
        }
    }

    pub fn data_count(&self) -> usize {
        self.state.data.len()
    }

    pub fn push_history(&mut self, entry: SearchHistoryEntry) {
        self.state.history.push(entry);
    }

    pub fn history(&self, user_id: &Uuid, limit: Option<usize>) -> Vec<SearchHistoryEntry> {
        let entries: Vec<SearchHistoryEntry> = self
            .state
            .history
            .iter()
            .filter(|entry| &entry.user_id == user_id)
            .cloned()
            .collect();

        match limit {
            Some(limit) if entries.len() > limit => entries[entries.len() - limit..].to_vec(),
            _ => entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_USER_EMAIL;
    use crate::search::SearchType;
    use tempfile::tempdir;

    fn text_data(owner: Uuid, content: &str) -> Data {
        Data::new(
            "text".to_string(),
            "txt".to_string(),
            "text/plain".to_string(),
            "/tmp/text.txt".to_string(),
            content,
            owner,
        )
    }

    #[tokio::test]
    async fn test_metadata_store_persistence() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("databases/metadata.json");

        let user_id = {
            let mut store = MetadataStore::open(store_path.clone()).await.unwrap();
            let user = store.get_or_create_user(DEFAULT_USER_EMAIL).await.unwrap();
            let dataset = store.ensure_dataset(user.id, "cs_explanations");
            store
                .upsert_data(&dataset.id, text_data(user.id, "quantum"))
                .unwrap();
            store.save().await.unwrap();
            user.id
        };

        let store = MetadataStore::open(store_path).await.unwrap();
        assert!(store.get_user(&user_id).is_some());
        let dataset = store.get_dataset_by_name(&user_id, "cs_explanations").unwrap();
        assert_eq!(store.dataset_data(&dataset.id).len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_merges_node_set_and_requeues() {
        let dir = tempdir().unwrap();
        let mut store = MetadataStore::open(dir.path().join("m.json")).await.unwrap();
        let owner = Uuid::new_v4();
        let dataset = store.ensure_dataset(owner, "ds");

        let first = store.upsert_data(&dataset.id, text_data(owner, "same")).unwrap();
        store.set_data_status(&first.id, DataStatus::Processed);

        let mut tagged = text_data(owner, "same");
        tagged.node_set = vec!["first".to_string()];
        let merged = store.upsert_data(&dataset.id, tagged).unwrap();

        assert_eq!(merged.id, first.id);
        assert_eq!(merged.node_set, vec!["first"]);
        assert_eq!(merged.status, DataStatus::Pending);
        assert_eq!(store.data_count(), 1);
    }

    #[tokio::test]
    async fn test_history_filter_and_limit() {
        let dir = tempdir().unwrap();
        let mut store = MetadataStore::open(dir.path().join("m.json")).await.unwrap();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        store.push_history(SearchHistoryEntry::query(user, SearchType::Chunks, "a"));
        store.push_history(SearchHistoryEntry::result(user, SearchType::Chunks, "[]".into()));
        store.push_history(SearchHistoryEntry::query(other, SearchType::Chunks, "b"));

        assert_eq!(store.history(&user, None).len(), 2);
        let last = store.history(&user, Some(1));
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].text, "[]");
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.json");
        let mut store = MetadataStore::open(path.clone()).await.unwrap();
        store.get_or_create_user(DEFAULT_USER_EMAIL).await.unwrap();
        assert!(path.exists());

        store.clear().await.unwrap();
        assert!(!path.exists());
        assert_eq!(store.data_count(), 0);
    }
}
