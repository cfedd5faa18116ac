// file: src/database/mod.rs
// description: database operations module exports and engine factories
// reference: internal module structure

pub mod client;
pub mod embeddings;
pub mod graph;
pub mod insert;
pub mod metadata;
pub mod schema;
pub mod vector;

pub use client::LanceDbClient;
pub use embeddings::{Embedder, GroqEmbeddingClient};
pub use graph::{GraphEngine, GraphSnapshot, GraphStore, JsonGraphEngine, MemoryGraphEngine};
pub use insert::{BatchInserter, InsertStats};
pub use metadata::MetadataStore;
pub use schema::SchemaManager;
pub use vector::{IndexPoint, LanceDbVectorEngine, MemoryVectorEngine, VectorEngine};

use crate::config::{Config, GraphProvider, VectorProvider};
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

pub async fn create_graph_engine(config: &Config) -> Result<Arc<dyn GraphEngine>> {
    info!("Creating graph engine (provider: {})", config.graph.provider);

    let engine: Arc<dyn GraphEngine> = match config.graph.provider {
        GraphProvider::Memory => Arc::new(MemoryGraphEngine::new()),
        GraphProvider::Json => Arc::new(JsonGraphEngine::open(config.graph_file_path()).await?),
    };
    Ok(engine)
}

pub async fn create_vector_engine(
    config: &Config,
    embedder: Arc<Embedder>,
) -> Result<Arc<dyn VectorEngine>> {
    info!("Creating vector engine (provider: {})", config.vector.provider);

    let engine: Arc<dyn VectorEngine> = match config.vector.provider {
        VectorProvider::Memory => Arc::new(MemoryVectorEngine::new(embedder)),
        VectorProvider::LanceDb => {
            Arc::new(LanceDbVectorEngine::open(&config.vector_uri(), embedder).await?)
        }
    };
    Ok(engine)
}
