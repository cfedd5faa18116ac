// file: src/search/retrievers.rs
// description: vector and graph backed retrievers for each search type
// reference: vector search seeds expanded through 1-hop graph connections

use crate::database::{GraphEngine, VectorEngine};
use crate::error::Result;
use crate::models::{NodeType, SearchResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn get_results(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;
}

/// Nearest neighbours from a single vector collection.
pub struct CollectionRetriever {
    vector: Arc<dyn VectorEngine>,
    collection: String,
}

impl CollectionRetriever {
    pub fn new(vector: Arc<dyn VectorEngine>, node_type: NodeType) -> Self {
        Self {
            vector,
            collection: node_type.collection(),
        }
    }

    pub fn chunks(vector: Arc<dyn VectorEngine>) -> Self {
        Self::new(vector, NodeType::DocumentChunk)
    }

    pub fn summaries(vector: Arc<dyn VectorEngine>) -> Self {
        Self::new(vector, NodeType::TextSummary)
    }
}

#[async_trait]
impl Retriever for CollectionRetriever {
    async fn get_results(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let results = self.vector.search(&self.collection, query, top_k).await?;
        debug!("{} hit(s) in {}", results.len(), self.collection);
        Ok(results)
    }
}

/// Matches entities and entity types, then returns every connection of the matches.
pub struct InsightsRetriever {
    graph: Arc<dyn GraphEngine>,
    vector: Arc<dyn VectorEngine>,
}

impl InsightsRetriever {
    pub fn new(graph: Arc<dyn GraphEngine>, vector: Arc<dyn VectorEngine>) -> Self {
        Self { graph, vector }
    }
}

#[async_trait]
impl Retriever for InsightsRetriever {
    async fn get_results(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let mut seeds = Vec::new();
        for node_type in [NodeType::Entity, NodeType::EntityType] {
            seeds.extend(
                self.vector
                    .search(&node_type.collection(), query, top_k)
                    .await?,
            );
        }
        seeds.sort_by(|a, b| b.score.total_cmp(&a.score));
        seeds.truncate(top_k);

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for seed in seeds {
            for triplet in self.graph.get_connections(seed.id).await? {
                let key = (
                    triplet.edge.source,
                    triplet.edge.target,
                    triplet.edge.relationship.clone(),
                );
                if !seen.insert(key) {
                    continue;
                }

                results.push(SearchResult::new(
                    seed.id,
                    seed.score,
                    seed.distance,
                    json!({
                        "text": triplet.describe(),
                        "source": triplet.source.name,
                        "relationship": triplet.edge.relationship,
                        "target": triplet.target.name,
                    }),
                ));
            }
        }

        debug!("Insights expanded to {} connection(s)", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Embedder, IndexPoint, MemoryGraphEngine, MemoryVectorEngine};
    use crate::models::{Edge, Node};

    async fn engines() -> (Arc<dyn GraphEngine>, Arc<dyn VectorEngine>) {
        let graph: Arc<dyn GraphEngine> = Arc::new(MemoryGraphEngine::new());
        let vector: Arc<dyn VectorEngine> =
            Arc::new(MemoryVectorEngine::new(Arc::new(Embedder::new(64))));

        let qubit = Node::new(NodeType::Entity, "qubit", "qubit");
        let unit = Node::new(NodeType::EntityType, "unit", "unit");
        let chunk = Node::new(NodeType::DocumentChunk, "c0", "doc #0")
            .with_text("A qubit is a unit of quantum information.");

        graph
            .add_nodes(vec![qubit.clone(), unit.clone(), chunk.clone()])
            .await
            .unwrap();
        graph
            .add_edges(vec![
                Edge::new(qubit.id, unit.id, "is_a"),
                Edge::new(chunk.id, qubit.id, "contains"),
            ])
            .await
            .unwrap();

        for node in [&qubit, &unit, &chunk] {
            vector
                .create_data_points(
                    &node.node_type.collection(),
                    vec![IndexPoint::new(node.id, node.index_text(), node.payload())],
                )
                .await
                .unwrap();
        }

        (graph, vector)
    }

    #[tokio::test]
    async fn test_chunks_retriever() {
        let (_, vector) = engines().await;
        let results = CollectionRetriever::chunks(vector)
            .get_results("qubit", 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].text().contains("quantum information"));
    }

    #[tokio::test]
    async fn test_summaries_missing_collection_is_empty() {
        let (_, vector) = engines().await;
        let results = CollectionRetriever::summaries(vector)
            .get_results("qubit", 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_insights_expand_connections() {
        let (graph, vector) = engines().await;
        let results = InsightsRetriever::new(graph, vector)
            .get_results("qubit", 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| r.payload["relationship"] == "is_a"));
        assert!(results.iter().any(|r| r.text() == "doc #0 --[contains]--> qubit"));
    }
}
