// file: src/prune.rs
// description: teardown of raw data and system stores
// reference: idempotent directory and database cleanup

use crate::config::StorageConfig;
use crate::database::{GraphEngine, MetadataStore, VectorEngine};
use crate::error::{MemoryError, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneOptions {
    pub graph: bool,
    pub vector: bool,
    pub metadata: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            graph: true,
            vector: true,
            metadata: false,
        }
    }
}

impl PruneOptions {
    pub fn everything() -> Self {
        Self {
            graph: true,
            vector: true,
            metadata: true,
        }
    }
}

/// Removes the data root directory. A missing directory is not an error.
pub async fn prune_data(storage: &StorageConfig) -> Result<()> {
    let root = &storage.data_root_directory;
    if !fs::try_exists(root).await.unwrap_or(false) {
        info!("Data root {} already absent", root.display());
        return Ok(());
    }

    fs::remove_dir_all(root)
        .await
        .map_err(|e| MemoryError::file(root, e))?;
    info!("Removed data root {}", root.display());
    Ok(())
}

pub async fn prune_system(
    graph: &dyn GraphEngine,
    vector: &dyn VectorEngine,
    metadata: &Mutex<MetadataStore>,
    options: PruneOptions,
) -> Result<()> {
    if options.graph {
        graph.delete_graph().await?;
        info!("Graph deleted");
    }

    if options.vector {
        vector.prune().await?;
        info!("Vector collections dropped");
    }

    if options.metadata {
        metadata.lock().await.clear().await?;
        info!("Metadata store cleared");
    }

    Ok(())
}
