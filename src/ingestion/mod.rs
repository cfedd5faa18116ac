// file: src/ingestion/mod.rs
// description: data ingestion module exports
// reference: internal module structure

pub mod classifier;
pub mod ingest;
pub mod scanner;
pub mod source;

pub use classifier::FileClassifier;
pub use ingest::Ingestor;
pub use scanner::{FileScanner, ScannedFile};
pub use source::DataSource;
