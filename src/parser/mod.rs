// file: src/parser/mod.rs
// description: text normalization and chunking module exports
// reference: internal module structure

pub mod chunker;
pub mod normalizer;

pub use chunker::{Chunk, CutType, TextChunker, split_sentences, word_count};
pub use normalizer::TextNormalizer;
