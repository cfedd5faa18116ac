// file: src/pipeline/orchestrator.rs
// description: coordinates pending data selection, graph building and vector indexing
// reference: orchestrates the asynchronous cognify workflow

use crate::config::Config;
use crate::database::{GraphEngine, IndexPoint, MetadataStore, VectorEngine};
use crate::error::{MemoryError, Result};
use crate::models::{Data, DataStatus, Node, User};
use crate::pipeline::processor::{DocumentProcessor, ProcessedDocument};
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::utils::telemetry::OperationTimer;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct CognifyPipeline {
    config: Config,
    processor: Arc<DocumentProcessor>,
    graph: Arc<dyn GraphEngine>,
    vector: Arc<dyn VectorEngine>,
    metadata: Arc<Mutex<MetadataStore>>,
    max_concurrent_tasks: usize,
}

impl CognifyPipeline {
    pub fn new(
        config: Config,
        graph: Arc<dyn GraphEngine>,
        vector: Arc<dyn VectorEngine>,
        metadata: Arc<Mutex<MetadataStore>>,
    ) -> Self {
        let processor = Arc::new(DocumentProcessor::new(&config));
        let max_concurrent_tasks = config.pipeline.parallel_workers.max(1);

        Self {
            config,
            processor,
            graph,
            vector,
            metadata,
            max_concurrent_tasks,
        }
    }

    /// Processes the pending items of `datasets` (every dataset of `owner` when empty).
    pub async fn run(&self, datasets: &[String], owner: &User) -> Result<PipelineStats> {
        info!("Starting cognify pipeline");
        let timer = OperationTimer::new("cognify");

        let pending = self.pending_data(datasets, owner).await?;
        info!("Found {} pending data item(s)", pending.len());

        if pending.is_empty() {
            warn!("Nothing to cognify");
            return Ok(PipelineStats::new());
        }

        let progress = Arc::new(if self.config.pipeline.show_progress {
            ProgressTracker::new(pending.len())
        } else {
            ProgressTracker::hidden(pending.len())
        });

        info!(
            "Processing data with {} concurrent tasks...",
            self.max_concurrent_tasks
        );

        let outcomes: Vec<(Uuid, DataStatus)> = stream::iter(pending)
            .map(|data| {
                let progress = progress.clone();
                async move {
                    progress.set_message(format!("Processing {}", data.name));
                    match self.process_data(&data).await {
                        Ok(processed) => {
                            progress.record_success(&processed);
                            (data.id, DataStatus::Processed)
                        }
                        Err(e) => {
                            progress.record_failure();
                            error!("Failed to cognify {}: {}", data.name, e);
                            (data.id, DataStatus::Failed)
                        }
                    }
                }
            })
            .buffer_unordered(self.max_concurrent_tasks)
            .collect()
            .await;

        {
            let mut store = self.metadata.lock().await;
            for (data_id, status) in &outcomes {
                store.set_data_status(data_id, *status);
            }
            store.save().await?;
        }

        let stats = progress.get_stats();
        progress.finish();
        timer.finish_with_count(stats.documents_processed);

        self.log_final_stats(&stats);

        Ok(stats)
    }

    async fn pending_data(&self, datasets: &[String], owner: &User) -> Result<Vec<Data>> {
        let store = self.metadata.lock().await;

        let selected = if datasets.is_empty() {
            store.list_datasets(&owner.id)
        } else {
            datasets
                .iter()
                .map(|name| {
                    store
                        .get_dataset_by_name(&owner.id, name)
                        .cloned()
                        .ok_or_else(|| MemoryError::DatasetNotFound(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let mut seen = HashSet::new();
        Ok(selected
            .iter()
            .flat_map(|dataset| store.dataset_data(&dataset.id))
            .filter(|data| data.is_pending() && seen.insert(data.id))
            .collect())
    }

    async fn process_data(&self, data: &Data) -> Result<ProcessedDocument> {
        let content = tokio::fs::read_to_string(&data.raw_data_location)
            .await
            .map_err(|e| MemoryError::file(&data.raw_data_location, e))?;

        let processed = tokio::task::spawn_blocking({
            let processor = self.processor.clone();
            let data = data.clone();
            move || processor.process(&data, &content)
        })
        .await
        .map_err(|e| MemoryError::Extraction(format!("Processing task failed: {}", e)))??;

        self.graph.add_nodes(processed.nodes.clone()).await?;
        self.graph.add_edges(processed.edges.clone()).await?;
        self.index_nodes(&processed.nodes).await?;

        Ok(processed)
    }

    /// Embeds every node into the collection of its type.
    async fn index_nodes(&self, nodes: &[Node]) -> Result<()> {
        let mut collections: BTreeMap<String, Vec<IndexPoint>> = BTreeMap::new();
        for node in nodes {
            collections
                .entry(node.node_type.collection())
                .or_default()
                .push(IndexPoint::new(node.id, node.index_text(), node.payload()));
        }

        for (collection, points) in collections {
            self.vector.create_data_points(&collection, points).await?;
        }
        Ok(())
    }

    fn log_final_stats(&self, stats: &PipelineStats) {
        info!("=== Cognify Execution Summary ===");
        info!("Duration: {:.2} seconds", stats.duration_secs);
        info!("Documents processed: {}", stats.documents_processed);
        info!("Documents failed: {}", stats.documents_failed);
        info!("Success rate: {:.2}%", stats.success_rate());
        info!("Chunks created: {}", stats.chunks_created);
        info!("Entities extracted: {}", stats.entities_extracted);
        info!(
            "Throughput: {:.2} MB/sec",
            stats.bytes_per_second() / 1_048_576.0
        );
        info!("=================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Embedder, MemoryGraphEngine, MemoryVectorEngine};
    use crate::ingestion::{DataSource, Ingestor};
    use crate::models::{DEFAULT_USER_EMAIL, NodeType};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        config: Config,
        pipeline: CognifyPipeline,
        graph: Arc<dyn GraphEngine>,
        vector: Arc<dyn VectorEngine>,
        metadata: Arc<Mutex<MetadataStore>>,
        user: User,
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default_config();
        config.storage.data_root_directory = temp.path().join("data");
        config.storage.system_root_directory = temp.path().join("system");
        config.vector.embedding_dimensions = 64;

        let mut store = MetadataStore::open(config.metadata_file_path()).await.unwrap();
        let user = store.get_or_create_user(DEFAULT_USER_EMAIL).await.unwrap();
        let metadata = Arc::new(Mutex::new(store));
        let graph: Arc<dyn GraphEngine> = Arc::new(MemoryGraphEngine::new());
        let vector: Arc<dyn VectorEngine> =
            Arc::new(MemoryVectorEngine::new(Arc::new(Embedder::new(64))));

        let pipeline =
            CognifyPipeline::new(config.clone(), graph.clone(), vector.clone(), metadata.clone());

        Fixture {
            _temp: temp,
            config,
            pipeline,
            graph,
            vector,
            metadata,
            user,
        }
    }

    async fn add(fixture: &Fixture, text: &str, dataset: &str) -> Data {
        let ingestor = Ingestor::new(&fixture.config);
        let mut store = fixture.metadata.lock().await;
        ingestor
            .add(
                &mut store,
                &[DataSource::Text(text.to_string())],
                dataset,
                &[],
                &fixture.user,
            )
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn test_cognify_builds_graph_and_indexes() {
        let fixture = fixture().await;
        add(
            &fixture,
            "A qubit is a unit of quantum information. Researchers at IBM Research measure qubits.",
            "main",
        )
        .await;

        let stats = fixture.pipeline.run(&[], &fixture.user).await.unwrap();
        assert_eq!(stats.documents_processed, 1);
        assert_eq!(stats.documents_failed, 0);
        assert_eq!(stats.chunks_created, 1);

        let (nodes, edges) = fixture.graph.get_graph_data().await.unwrap();
        assert!(nodes.iter().any(|n| n.node_type == NodeType::Entity));
        assert!(!edges.is_empty());

        let collections = fixture.vector.list_collections().await.unwrap();
        assert!(collections.contains(&NodeType::DocumentChunk.collection()));
        assert!(collections.contains(&NodeType::Entity.collection()));
    }

    #[tokio::test]
    async fn test_processed_items_are_not_reprocessed() {
        let fixture = fixture().await;
        add(&fixture, "Rust is a language. Rust compiles fast.", "main").await;

        let first = fixture.pipeline.run(&["main".to_string()], &fixture.user).await.unwrap();
        let second = fixture.pipeline.run(&["main".to_string()], &fixture.user).await.unwrap();

        assert_eq!(first.documents_processed, 1);
        assert_eq!(second, PipelineStats::new());
    }

    #[tokio::test]
    async fn test_failed_item_does_not_abort_run() {
        let fixture = fixture().await;
        let broken = add(&fixture, "This file will vanish.", "main").await;
        add(&fixture, "This one stays around.", "main").await;
        std::fs::remove_file(&broken.raw_data_location).unwrap();

        let stats = fixture.pipeline.run(&[], &fixture.user).await.unwrap();
        assert_eq!(stats.documents_processed, 1);
        assert_eq!(stats.documents_failed, 1);

        let store = fixture.metadata.lock().await;
        let dataset = store.get_dataset_by_name(&fixture.user.id, "main").unwrap();
        let failed: Vec<_> = store
            .dataset_data(&dataset.id)
            .into_iter()
            .filter(|d| d.status == DataStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, broken.id);
    }

    #[tokio::test]
    async fn test_unknown_dataset() {
        let fixture = fixture().await;
        let result = fixture.pipeline.run(&["missing".to_string()], &fixture.user).await;
        assert!(matches!(result, Err(MemoryError::DatasetNotFound(_))));
    }
}
