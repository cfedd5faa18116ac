// file: src/retrieval/mod.rs
// description: graph context retrieval module exports
// reference: internal module structure

pub mod graph_completion;

pub use graph_completion::{GraphCompletionOptions, GraphCompletionRetriever};
