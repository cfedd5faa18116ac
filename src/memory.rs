// file: src/memory.rs
// description: high level api over ingestion, cognify, search and pruning
// reference: lazily created engines shared across operations

use crate::config::{Config, GraphProvider, StorageConfig, VectorProvider};
use crate::database::{
    Embedder, GraphEngine, MetadataStore, VectorEngine, create_graph_engine, create_vector_engine,
};
use crate::error::Result;
use crate::exporter::{ExportManifest, GraphExporter};
use crate::ingestion::{DataSource, Ingestor};
use crate::models::{
    DEFAULT_USER_EMAIL, Data, Dataset, NodeType, SearchHistoryEntry, SearchResult, User,
};
use crate::pipeline::{CognifyPipeline, PipelineStats};
use crate::prune::{self, PruneOptions};
use crate::retrieval::{GraphCompletionOptions, GraphCompletionRetriever};
use crate::search::{self, SearchRequest, SearchService, SearchType};
use crate::utils::telemetry::{HealthCheck, HealthReport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
struct Engines {
    graph: Arc<dyn GraphEngine>,
    vector: Arc<dyn VectorEngine>,
    metadata: Arc<Mutex<MetadataStore>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub graph_provider: GraphProvider,
    pub vector_provider: VectorProvider,
    pub nodes: usize,
    pub edges: usize,
    pub collections: Vec<String>,
    pub datasets: usize,
    pub data_items: usize,
}

pub struct GraphMemory {
    config: Config,
    embedder: Arc<Embedder>,
    engines: Mutex<Option<Engines>>,
}

impl GraphMemory {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let embedder = Arc::new(Embedder::from_config(&config.vector));

        Ok(Self {
            config,
            embedder,
            engines: Mutex::new(None),
        })
    }

    pub fn from_config_file(path: Option<&Path>) -> Result<Self> {
        Self::new(Config::load(path)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage_config(&self) -> &StorageConfig {
        &self.config.storage
    }

    pub fn set_graph_database_provider(&mut self, provider: GraphProvider) {
        self.config.graph.provider = provider;
        self.reset_engines();
    }

    pub fn set_vector_db_provider(&mut self, provider: VectorProvider) {
        self.config.vector.provider = provider;
        self.reset_engines();
    }

    pub fn set_data_root_directory(&mut self, path: impl Into<PathBuf>) {
        self.config.storage.data_root_directory = path.into();
        self.reset_engines();
    }

    pub fn set_system_root_directory(&mut self, path: impl Into<PathBuf>) {
        self.config.storage.system_root_directory = path.into();
        self.reset_engines();
    }

    fn reset_engines(&mut self) {
        *self.engines.get_mut() = None;
    }

    async fn engines(&self) -> Result<Engines> {
        let mut cached = self.engines.lock().await;
        if let Some(engines) = cached.as_ref() {
            return Ok(engines.clone());
        }

        let engines = Engines {
            graph: create_graph_engine(&self.config).await?,
            vector: create_vector_engine(&self.config, self.embedder.clone()).await?,
            metadata: Arc::new(Mutex::new(
                MetadataStore::open(self.config.metadata_file_path()).await?,
            )),
        };
        info!(
            "Engines ready (graph: {}, vector: {})",
            self.config.graph.provider, self.config.vector.provider
        );

        *cached = Some(engines.clone());
        Ok(engines)
    }

    pub async fn graph_engine(&self) -> Result<Arc<dyn GraphEngine>> {
        Ok(self.engines().await?.graph)
    }

    pub async fn vector_engine(&self) -> Result<Arc<dyn VectorEngine>> {
        Ok(self.engines().await?.vector)
    }

    pub async fn metadata_store(&self) -> Result<Arc<Mutex<MetadataStore>>> {
        Ok(self.engines().await?.metadata)
    }

    pub async fn default_user(&self) -> Result<User> {
        let metadata = self.metadata_store().await?;
        let mut store = metadata.lock().await;
        store.get_or_create_user(DEFAULT_USER_EMAIL).await
    }

    /// Registers `sources` in `dataset_name`, tagging them with `node_set` when given.
    pub async fn add(
        &self,
        sources: &[DataSource],
        dataset_name: &str,
        node_set: Option<&[String]>,
    ) -> Result<Vec<Data>> {
        let user = self.default_user().await?;
        let metadata = self.metadata_store().await?;
        let mut store = metadata.lock().await;

        Ingestor::new(&self.config)
            .add(
                &mut store,
                sources,
                dataset_name,
                node_set.unwrap_or_default(),
                &user,
            )
            .await
    }

    /// Builds the knowledge graph for `datasets`, or for every dataset when empty.
    pub async fn cognify(&self, datasets: &[&str]) -> Result<PipelineStats> {
        let user = self.default_user().await?;
        let engines = self.engines().await?;
        let names: Vec<String> = datasets.iter().map(|d| d.to_string()).collect();

        CognifyPipeline::new(
            self.config.clone(),
            engines.graph,
            engines.vector,
            engines.metadata,
        )
        .run(&names, &user)
        .await
    }

    pub async fn search(
        &self,
        query_type: SearchType,
        query_text: &str,
    ) -> Result<Vec<SearchResult>> {
        self.search_with(SearchRequest::new(query_type, query_text))
            .await
    }

    pub async fn search_with(&self, request: SearchRequest) -> Result<Vec<SearchResult>> {
        let user = match request.user.clone() {
            Some(user) => user,
            None => self.default_user().await?,
        };
        let engines = self.engines().await?;

        SearchService::new(
            self.config.search.clone(),
            engines.graph,
            engines.vector,
            engines.metadata,
        )
        .search(&request, &user)
        .await
    }

    pub async fn get_history(
        &self,
        user_id: &Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHistoryEntry>> {
        let metadata = self.metadata_store().await?;
        let store = metadata.lock().await;
        Ok(search::get_history(&store, user_id, limit))
    }

    pub async fn graph_completion_retriever(
        &self,
        node_type: Option<NodeType>,
        node_names: Vec<String>,
    ) -> Result<GraphCompletionRetriever> {
        let engines = self.engines().await?;

        Ok(GraphCompletionRetriever::new(
            engines.graph,
            engines.vector,
            GraphCompletionOptions {
                top_k: self.config.search.top_k,
                triplet_candidates: self.config.search.triplet_candidates,
                node_type,
                node_names,
            },
        ))
    }

    pub async fn prune_data(&self) -> Result<()> {
        prune::prune_data(&self.config.storage).await
    }

    pub async fn prune_system(&self, options: PruneOptions) -> Result<()> {
        let engines = self.engines().await?;
        prune::prune_system(
            engines.graph.as_ref(),
            engines.vector.as_ref(),
            &engines.metadata,
            options,
        )
        .await
    }

    pub async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let user = self.default_user().await?;
        let metadata = self.metadata_store().await?;
        let store = metadata.lock().await;
        Ok(store.list_datasets(&user.id))
    }

    pub async fn stats(&self) -> Result<MemoryStats> {
        let engines = self.engines().await?;
        let (nodes, edges) = engines.graph.get_graph_data().await?;
        let collections = engines.vector.list_collections().await?;
        let datasets = self.list_datasets().await?.len();
        let data_items = engines.metadata.lock().await.data_count();

        Ok(MemoryStats {
            graph_provider: engines.graph.provider(),
            vector_provider: engines.vector.provider(),
            nodes: nodes.len(),
            edges: edges.len(),
            collections,
            datasets,
            data_items,
        })
    }

    pub async fn health(&self) -> HealthReport {
        let version = env!("CARGO_PKG_VERSION").to_string();
        let start = Instant::now();

        let engines = match self.engines().await {
            Ok(engines) => engines,
            Err(e) => {
                let check = HealthCheck::unhealthy("engines", e.to_string(), start.elapsed());
                return HealthReport::new(vec![check], version);
            }
        };

        let mut checks = Vec::new();

        let start = Instant::now();
        let graph = engines.graph.get_graph_data().await;
        let node_count = graph.as_ref().map(|(nodes, _)| nodes.len()).unwrap_or(0);
        let probe = graph
            .map(|(nodes, edges)| format!("{} nodes, {} edges", nodes.len(), edges.len()));
        checks.push(HealthCheck::from_probe("graph", probe, start.elapsed()));

        let start = Instant::now();
        let check = match engines.vector.list_collections().await {
            // a cognified graph always indexes at least its chunks
            Ok(collections) if collections.is_empty() && node_count > 0 => HealthCheck::degraded(
                "vector",
                format!("graph holds {} nodes but no collection is indexed", node_count),
                start.elapsed(),
            ),
            probe => HealthCheck::from_probe(
                "vector",
                probe.map(|collections| format!("{} collections", collections.len())),
                start.elapsed(),
            ),
        };
        checks.push(check);

        let start = Instant::now();
        let data_items = engines.metadata.lock().await.data_count();
        checks.push(HealthCheck::from_probe(
            "metadata",
            Ok(format!("{} data items", data_items)),
            start.elapsed(),
        ));

        HealthReport::new(checks, version)
    }

    pub async fn export_graph(
        &self,
        output_dir: impl Into<PathBuf>,
        pretty: bool,
    ) -> Result<ExportManifest> {
        let graph = self.graph_engine().await?;
        GraphExporter::new(output_dir)?
            .export(graph.as_ref(), pretty)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory(temp: &TempDir) -> GraphMemory {
        let mut config = Config::default_config();
        config.vector.embedding_dimensions = 64;
        let mut memory = GraphMemory::new(config).unwrap();
        memory.set_graph_database_provider(GraphProvider::Memory);
        memory.set_vector_db_provider(VectorProvider::Memory);
        memory.set_data_root_directory(temp.path().join("data"));
        memory.set_system_root_directory(temp.path().join("system"));
        memory
    }

    #[tokio::test]
    async fn test_setters_update_config() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        assert_eq!(memory.config().graph.provider, GraphProvider::Memory);
        assert_eq!(
            memory.storage_config().data_root_directory,
            temp.path().join("data")
        );
        assert_eq!(
            memory.graph_engine().await.unwrap().provider(),
            GraphProvider::Memory
        );
    }

    #[tokio::test]
    async fn test_engines_are_cached_until_reset() {
        let temp = TempDir::new().unwrap();
        let mut memory = memory(&temp);

        let first = memory.graph_engine().await.unwrap();
        let second = memory.graph_engine().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        memory.set_graph_database_provider(GraphProvider::Json);
        let third = memory.graph_engine().await.unwrap();
        assert_eq!(third.provider(), GraphProvider::Json);
    }

    #[tokio::test]
    async fn test_add_cognify_search_roundtrip() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        memory
            .add(
                &[DataSource::Text(
                    "Rust is a language empowering everyone. Rust guarantees memory safety."
                        .to_string(),
                )],
                "main",
                None,
            )
            .await
            .unwrap();
        let stats = memory.cognify(&["main"]).await.unwrap();
        assert_eq!(stats.documents_processed, 1);

        let chunks = memory.search(SearchType::Chunks, "memory safety").await.unwrap();
        assert!(!chunks.is_empty());

        let user = memory.default_user().await.unwrap();
        assert_eq!(memory.get_history(&user.id, None).await.unwrap().len(), 2);

        let stats = memory.stats().await.unwrap();
        assert_eq!(stats.datasets, 1);
        assert!(stats.nodes > 0);
        assert!(memory.health().await.is_healthy());
    }

    #[tokio::test]
    async fn test_health_degraded_when_graph_is_not_indexed() {
        let temp = TempDir::new().unwrap();
        let memory = memory(&temp);

        let graph = memory.graph_engine().await.unwrap();
        graph
            .add_nodes(vec![crate::models::Node::new(NodeType::Entity, "qubit", "qubit")])
            .await
            .unwrap();

        let report = memory.health().await;
        assert_eq!(
            report.overall_status,
            crate::utils::telemetry::HealthStatus::Degraded
        );
    }
}
