// file: src/models/document.rs
// description: ingested data records and the datasets that group them
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Pending,
    Processed,
    Failed,
}

/// One ingested item: a file left in place or a text persisted under the data root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    pub id: Uuid,
    pub name: String,
    pub extension: String,
    pub mime_type: String,
    pub raw_data_location: String,
    pub content_hash: String,
    pub owner_id: Uuid,
    #[serde(default)]
    pub node_set: Vec<String>,
    pub status: DataStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Data {
    pub fn new(
        name: String,
        extension: String,
        mime_type: String,
        raw_data_location: String,
        content: &str,
        owner_id: Uuid,
    ) -> Self {
        let content_hash = Self::compute_hash(content);
        let now = Utc::now();

        Self {
            id: Self::derive_id(&owner_id, &content_hash),
            name,
            extension,
            mime_type,
            raw_data_location,
            content_hash,
            owner_id,
            node_set: Vec::new(),
            status: DataStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Identical content ingested by the same owner always maps to the same id.
    pub fn derive_id(owner_id: &Uuid, content_hash: &str) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("data:{}:{}", owner_id, content_hash).as_bytes(),
        )
    }

    /// Merges node-set tags, returning true when a new tag was added.
    pub fn merge_node_set(&mut self, tags: &[String]) -> bool {
        let mut changed = false;
        for tag in tags {
            let tag = tag.trim();
            if !tag.is_empty() && !self.node_set.iter().any(|t| t == tag) {
                self.node_set.push(tag.to_string());
                changed = true;
            }
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub fn set_status(&mut self, status: DataStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn is_pending(&self) -> bool {
        self.status != DataStatus::Processed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub data_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(name: &str, owner_id: Uuid) -> Self {
        Self {
            id: Self::derive_id(&owner_id, name),
            name: name.to_string(),
            owner_id,
            data_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn derive_id(owner_id: &Uuid, name: &str) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("dataset:{}:{}", owner_id, name).as_bytes(),
        )
    }

    pub fn link(&mut self, data_id: Uuid) {
        if !self.data_ids.contains(&data_id) {
            self.data_ids.push(data_id);
        }
    }
}
