// file: src/pipeline/processor.rs
// description: turns one data item into knowledge graph nodes and edges
// reference: normalizes text, chunks it, runs extractors and builds graph models

use crate::config::Config;
use crate::error::{MemoryError, Result};
use crate::extractor::{GraphExtractor, Summarizer, entity_key};
use crate::models::{Data, Edge, Node, NodeType};
use crate::parser::{TextChunker, TextNormalizer};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

pub const IS_PART_OF: &str = "is_part_of";
pub const CONTAINS: &str = "contains";
pub const IS_A: &str = "is_a";
pub const MADE_FROM: &str = "made_from";
pub const BELONGS_TO_SET: &str = "belongs_to_set";

#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub data_id: Uuid,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub chunks_created: usize,
    pub entities_extracted: usize,
    pub bytes: u64,
}

pub struct DocumentProcessor {
    normalizer: Option<TextNormalizer>,
    chunker: TextChunker,
    extractor: GraphExtractor,
    summarizer: Summarizer,
}

impl DocumentProcessor {
    pub fn new(config: &Config) -> Self {
        let normalizer = if config.extraction.normalize_text {
            Some(TextNormalizer::new())
        } else {
            None
        };

        Self {
            normalizer,
            chunker: TextChunker::new(config.pipeline.max_chunk_words),
            extractor: GraphExtractor::new(&config.extraction),
            summarizer: Summarizer::new(config.extraction.summary_sentences),
        }
    }

    pub fn process(&self, data: &Data, content: &str) -> Result<ProcessedDocument> {
        info!("Processing data item: {}", data.name);

        let text = match self.normalizer {
            Some(ref normalizer) => normalizer.normalize(content)?,
            None => content.trim().to_string(),
        };

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(MemoryError::Extraction(format!(
                "No text to process in {}",
                data.name
            )));
        }

        let mut nodes: Vec<Node> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut entities: HashMap<Uuid, Node> = HashMap::new();
        let mut entity_types: HashMap<Uuid, Node> = HashMap::new();

        let document = Node::new(NodeType::TextDocument, &data.id.to_string(), data.name.clone())
            .with_property("data_id", data.id.to_string())
            .with_property("mime_type", data.mime_type.clone())
            .with_property("raw_data_location", data.raw_data_location.clone())
            .with_property("content_hash", data.content_hash.clone());
        let document_id = document.id;
        nodes.push(document);

        let mut chunk_ids = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let chunk_key = format!("{}:{}", data.id, chunk.index);
            let chunk_node = Node::new(
                NodeType::DocumentChunk,
                &chunk_key,
                format!("{} #{}", data.name, chunk.index),
            )
            .with_text(chunk.text.clone())
            .with_property("chunk_index", chunk.index)
            .with_property("word_count", chunk.word_count)
            .with_property("cut_type", format!("{:?}", chunk.cut_type));
            let chunk_id = chunk_node.id;
            chunk_ids.push(chunk_id);
            nodes.push(chunk_node);
            edges.push(Edge::new(chunk_id, document_id, IS_PART_OF));

            let extracted = self.extractor.extract(&chunk.text);
            debug!(
                "Chunk {} of {}: {} entities, {} relations",
                chunk.index,
                data.name,
                extracted.entities.len(),
                extracted.relations.len()
            );

            for entity in &extracted.entities {
                let type_node = entity_types
                    .entry(Node::derive_id(NodeType::EntityType, &entity.entity_type))
                    .or_insert_with(|| {
                        Node::new(
                            NodeType::EntityType,
                            &entity.entity_type,
                            entity.entity_type.clone(),
                        )
                    });
                let type_id = type_node.id;

                let entity_node = entities
                    .entry(Node::derive_id(NodeType::Entity, &entity.key()))
                    .or_insert_with(|| {
                        Node::new(NodeType::Entity, &entity.key(), entity.name.clone())
                            .with_property("description", entity.description.clone())
                            .with_property("entity_type", entity.entity_type.clone())
                    });
                let entity_id = entity_node.id;

                edges.push(Edge::new(chunk_id, entity_id, CONTAINS));
                edges.push(Edge::new(entity_id, type_id, IS_A));
            }

            for relation in &extracted.relations {
                edges.push(Edge::new(
                    Node::derive_id(NodeType::Entity, &entity_key(&relation.source)),
                    Node::derive_id(NodeType::Entity, &entity_key(&relation.target)),
                    relation.relationship.clone(),
                ));
            }

            let summary = self.summarizer.summarize(&chunk.text);
            if !summary.is_empty() {
                let summary_node = Node::new(
                    NodeType::TextSummary,
                    &chunk_key,
                    format!("Summary of {} #{}", data.name, chunk.index),
                )
                .with_text(summary);
                edges.push(Edge::new(summary_node.id, chunk_id, MADE_FROM));
                nodes.push(summary_node);
            }
        }

        for tag in &data.node_set {
            let set_node = Node::new(NodeType::NodeSet, tag, tag.clone());
            let set_id = set_node.id;
            nodes.push(set_node);

            edges.push(Edge::new(document_id, set_id, BELONGS_TO_SET));
            for chunk_id in &chunk_ids {
                edges.push(Edge::new(*chunk_id, set_id, BELONGS_TO_SET));
            }
            for entity_id in entities.keys() {
                edges.push(Edge::new(*entity_id, set_id, BELONGS_TO_SET));
            }
        }

        let entities_extracted = entities.len();
        nodes.extend(entity_types.into_values());
        nodes.extend(entities.into_values());

        Ok(ProcessedDocument {
            data_id: data.id,
            nodes,
            edges,
            chunks_created: chunks.len(),
            entities_extracted,
            bytes: content.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data(content: &str, node_set: &[&str]) -> Data {
        let mut data = Data::new(
            "quantum".to_string(),
            "txt".to_string(),
            "text/plain".to_string(),
            "/tmp/quantum.txt".to_string(),
            content,
            Uuid::new_v4(),
        );
        data.node_set = node_set.iter().map(|s| s.to_string()).collect();
        data
    }

    fn count(nodes: &[Node], node_type: NodeType) -> usize {
        nodes.iter().filter(|n| n.node_type == node_type).count()
    }

    const TEXT: &str = "A quantum computer is a computer that exploits quantum mechanics. \
        Researchers at IBM Research build quantum computers.";

    #[test]
    fn test_builds_document_graph() {
        let processor = DocumentProcessor::new(&Config::default_config());
        let item = data(TEXT, &[]);
        let processed = processor.process(&item, TEXT).unwrap();

        assert_eq!(count(&processed.nodes, NodeType::TextDocument), 1);
        assert_eq!(count(&processed.nodes, NodeType::DocumentChunk), 1);
        assert_eq!(count(&processed.nodes, NodeType::TextSummary), 1);
        assert_eq!(count(&processed.nodes, NodeType::NodeSet), 0);
        assert_eq!(processed.chunks_created, 1);
        assert!(processed.entities_extracted >= 2);
        assert_eq!(
            count(&processed.nodes, NodeType::Entity),
            processed.entities_extracted
        );

        let relationships: Vec<&str> = processed
            .edges
            .iter()
            .map(|e| e.relationship.as_str())
            .collect();
        for expected in [IS_PART_OF, CONTAINS, IS_A, MADE_FROM] {
            assert!(relationships.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_edges_reference_known_nodes() {
        let processor = DocumentProcessor::new(&Config::default_config());
        let item = data(TEXT, &["first"]);
        let processed = processor.process(&item, TEXT).unwrap();

        let ids: std::collections::HashSet<Uuid> = processed.nodes.iter().map(|n| n.id).collect();
        for edge in &processed.edges {
            assert!(ids.contains(&edge.source), "dangling source {:?}", edge);
            assert!(ids.contains(&edge.target), "dangling target {:?}", edge);
        }
    }

    #[test]
    fn test_node_set_membership() {
        let processor = DocumentProcessor::new(&Config::default_config());
        let item = data(TEXT, &["first"]);
        let processed = processor.process(&item, TEXT).unwrap();

        let set_id = Node::derive_id(NodeType::NodeSet, "first");
        let members = processed
            .edges
            .iter()
            .filter(|e| e.relationship == BELONGS_TO_SET && e.target == set_id)
            .count();

        assert_eq!(members, 1 + 1 + processed.entities_extracted);
    }

    #[test]
    fn test_ids_are_stable_across_runs() {
        let processor = DocumentProcessor::new(&Config::default_config());
        let item = data(TEXT, &[]);
        let first = processor.process(&item, TEXT).unwrap();
        let second = processor.process(&item, TEXT).unwrap();

        let mut a: Vec<Uuid> = first.nodes.iter().map(|n| n.id).collect();
        let mut b: Vec<Uuid> = second.nodes.iter().map(|n| n.id).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_content_fails() {
        let processor = DocumentProcessor::new(&Config::default_config());
        let item = data(" ", &[]);
        assert!(processor.process(&item, "  \n ").is_err());
    }
}
