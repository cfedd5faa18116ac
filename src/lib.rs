// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod database;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod ingestion;
pub mod memory;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prune;
pub mod retrieval;
pub mod search;
pub mod utils;

pub use config::{
    Config, ExtractionConfig, GraphConfig, GraphProvider, PipelineConfig, SearchConfig,
    StorageConfig, VectorConfig, VectorProvider,
};
pub use database::{
    Embedder, GraphEngine, GraphSnapshot, JsonGraphEngine, LanceDbVectorEngine, MemoryGraphEngine,
    MemoryVectorEngine, MetadataStore, VectorEngine,
};
pub use error::{MemoryError, Result};
pub use exporter::{ExportManifest, GraphExporter};
pub use ingestion::{DataSource, FileScanner, Ingestor, ScannedFile};
pub use memory::{GraphMemory, MemoryStats};
pub use models::{
    Data, DataStatus, Dataset, Edge, HistoryKind, Node, NodeType, SearchHistoryEntry,
    SearchResult, Triplet, User,
};
pub use pipeline::{CognifyPipeline, PipelineStats, ProgressTracker};
pub use prune::PruneOptions;
pub use retrieval::{GraphCompletionOptions, GraphCompletionRetriever};
pub use search::{Retriever, SearchRequest, SearchService, SearchType};
pub use utils::{
    HealthCheck, HealthReport, HealthStatus, OperationMetrics, OperationTimer, Validator,
};
