// file: src/extractor/mod.rs
// description: entity extraction and summarization module exports
// reference: internal module structure

pub mod graph;
pub mod patterns;
pub mod summary;

pub use graph::{
    CONCEPT_TYPE, DEFAULT_RELATIONSHIP, ExtractedEntity, ExtractedGraph, ExtractedRelation,
    GraphExtractor, NAMED_ENTITY_TYPE, entity_key,
};
pub use summary::Summarizer;
