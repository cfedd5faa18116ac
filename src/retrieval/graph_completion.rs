// file: src/retrieval/graph_completion.rs
// description: ranks graph triplets against a query and renders them as context text
// reference: vector relevance of triplet endpoints over an optional node-set subgraph

use crate::database::{GraphEngine, VectorEngine};
use crate::error::Result;
use crate::models::{Node, NodeType, SearchResult, Triplet};
use crate::search::Retriever;
use crate::utils::validation::Validator;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const NODE_CONTENT_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct GraphCompletionOptions {
    pub top_k: usize,
    /// Hits requested from each vector collection when scoring endpoints.
    pub triplet_candidates: usize,
    pub node_type: Option<NodeType>,
    pub node_names: Vec<String>,
}

impl Default for GraphCompletionOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            triplet_candidates: 100,
            node_type: None,
            node_names: Vec::new(),
        }
    }
}

pub struct GraphCompletionRetriever {
    graph: Arc<dyn GraphEngine>,
    vector: Arc<dyn VectorEngine>,
    options: GraphCompletionOptions,
}

impl GraphCompletionRetriever {
    pub fn new(
        graph: Arc<dyn GraphEngine>,
        vector: Arc<dyn VectorEngine>,
        options: GraphCompletionOptions,
    ) -> Self {
        Self {
            graph,
            vector,
            options,
        }
    }

    pub fn options(&self) -> &GraphCompletionOptions {
        &self.options
    }

    /// The `top_k` triplets whose endpoints are most relevant to `query`.
    pub async fn get_triplets(&self, query: &str) -> Result<Vec<Triplet>> {
        let (nodes, edges) = match self.options.node_type {
            Some(node_type) if !self.options.node_names.is_empty() => {
                self.graph
                    .get_nodeset_subgraph(node_type, &self.options.node_names)
                    .await?
            }
            _ => self.graph.get_graph_data().await?,
        };

        if edges.is_empty() {
            debug!("No candidate edges for graph completion");
            return Ok(Vec::new());
        }

        let relevance = self.relevance(query).await?;
        let nodes: HashMap<Uuid, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut scored: Vec<(f32, Triplet)> = edges
            .into_iter()
            .filter_map(|edge| {
                let source = nodes.get(&edge.source)?.clone();
                let target = nodes.get(&edge.target)?.clone();
                let score = (relevance.get(&source.id).copied().unwrap_or(0.0)
                    + relevance.get(&target.id).copied().unwrap_or(0.0))
                    / 2.0;
                Some((
                    score,
                    Triplet {
                        source,
                        edge,
                        target,
                    },
                ))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.describe().cmp(&b.1.describe()))
        });
        scored.truncate(self.options.top_k);

        debug!("Selected {} triplet(s) for graph completion", scored.len());
        Ok(scored.into_iter().map(|(_, triplet)| triplet).collect())
    }

    /// Nodes and connections of the selected triplets as plain text; empty when nothing matched.
    pub async fn get_context(&self, query: &str) -> Result<String> {
        let triplets = self.get_triplets(query).await?;
        Ok(render_context(&triplets))
    }

    /// Best score per node id across every indexed collection.
    async fn relevance(&self, query: &str) -> Result<HashMap<Uuid, f32>> {
        let mut relevance: HashMap<Uuid, f32> = HashMap::new();

        for collection in self.vector.list_collections().await? {
            for hit in self
                .vector
                .search(&collection, query, self.options.triplet_candidates)
                .await?
            {
                let entry = relevance.entry(hit.id).or_insert(hit.score);
                if hit.score > *entry {
                    *entry = hit.score;
                }
            }
        }

        Ok(relevance)
    }
}

#[async_trait]
impl Retriever for GraphCompletionRetriever {
    async fn get_results(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let mut triplets = self.get_triplets(query).await?;
        triplets.truncate(top_k);

        let context = render_context(&triplets);
        if context.is_empty() {
            return Ok(Vec::new());
        }

        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("context:{}", query).as_bytes());
        Ok(vec![SearchResult::new(
            id,
            1.0,
            None,
            json!({
                "text": context,
                "triplets": triplets.len(),
            }),
        )])
    }
}

fn render_context(triplets: &[Triplet]) -> String {
    if triplets.is_empty() {
        return String::new();
    }

    let mut seen = HashSet::new();
    let mut nodes = String::from("Nodes:\n");
    for node in triplets.iter().flat_map(|t| [&t.source, &t.target]) {
        if seen.insert(node.id) {
            nodes.push_str(&format!(
                "- {} ({}): {}\n",
                node.name,
                node.node_type,
                Validator::truncate_text(&node_content(node), NODE_CONTENT_CHARS)
            ));
        }
    }

    let mut connections = String::from("Connections:\n");
    for triplet in triplets {
        connections.push_str(&format!("- {}\n", triplet.describe()));
    }

    format!("{}\n{}", nodes, connections)
}

fn node_content(node: &Node) -> String {
    if let Some(text) = &node.text {
        return text.clone();
    }
    node.properties
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| node.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Embedder, IndexPoint, MemoryGraphEngine, MemoryVectorEngine};
    use crate::models::Edge;

    async fn engines() -> (Arc<dyn GraphEngine>, Arc<dyn VectorEngine>) {
        let graph: Arc<dyn GraphEngine> = Arc::new(MemoryGraphEngine::new());
        let vector: Arc<dyn VectorEngine> =
            Arc::new(MemoryVectorEngine::new(Arc::new(Embedder::new(128))));

        let nlp = Node::new(NodeType::Entity, "nlp", "natural language processing")
            .with_property("description", "A field of computer science.");
        let field = Node::new(NodeType::EntityType, "field", "field");
        let qubit = Node::new(NodeType::Entity, "qubit", "qubit");
        let unit = Node::new(NodeType::EntityType, "unit", "unit");
        let set = Node::new(NodeType::NodeSet, "first", "first");

        let nodes = vec![nlp.clone(), field.clone(), qubit.clone(), unit.clone(), set.clone()];
        graph.add_nodes(nodes.clone()).await.unwrap();
        graph
            .add_edges(vec![
                Edge::new(nlp.id, field.id, "is_a"),
                Edge::new(qubit.id, unit.id, "is_a"),
                Edge::new(nlp.id, set.id, "belongs_to_set"),
            ])
            .await
            .unwrap();

        for node in &nodes {
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

    fn options(top_k: usize) -> GraphCompletionOptions {
        GraphCompletionOptions {
            top_k,
            ..GraphCompletionOptions::default()
        }
    }

    #[tokio::test]
    async fn test_triplets_ranked_by_relevance() {
        let (graph, vector) = engines().await;
        let retriever = GraphCompletionRetriever::new(graph, vector, options(1));

        let triplets = retriever.get_triplets("qubit unit").await.unwrap();
        assert_eq!(triplets.len(), 1);
        assert_eq!(triplets[0].describe(), "qubit --[is_a]--> unit");
    }

    #[tokio::test]
    async fn test_context_sections() {
        let (graph, vector) = engines().await;
        let retriever = GraphCompletionRetriever::new(graph, vector, options(5));

        let context = retriever.get_context("natural language processing").await.unwrap();
        assert!(context.starts_with("Nodes:\n"));
        assert!(context.contains("Connections:\n"));
        assert!(context.contains("- natural language processing (Entity): A field of computer science."));
        assert!(context.contains("natural language processing --[is_a]--> field"));
    }

    #[tokio::test]
    async fn test_node_set_filter() {
        let (graph, vector) = engines().await;

        let scoped = GraphCompletionRetriever::new(
            graph.clone(),
            vector.clone(),
            GraphCompletionOptions {
                node_type: Some(NodeType::NodeSet),
                node_names: vec!["first".to_string()],
                ..options(10)
            },
        );
        let context = scoped.get_context("qubit").await.unwrap();
        assert!(!context.is_empty());
        assert!(!context.contains("qubit --[is_a]--> unit"));

        let missing = GraphCompletionRetriever::new(
            graph,
            vector,
            GraphCompletionOptions {
                node_type: Some(NodeType::NodeSet),
                node_names: vec!["nonexistent".to_string()],
                ..options(10)
            },
        );
        assert_eq!(missing.get_context("qubit").await.unwrap(), "");
        assert!(missing.get_results("qubit", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_graph_has_empty_context() {
        let graph: Arc<dyn GraphEngine> = Arc::new(MemoryGraphEngine::new());
        let vector: Arc<dyn VectorEngine> =
            Arc::new(MemoryVectorEngine::new(Arc::new(Embedder::new(32))));
        let retriever = GraphCompletionRetriever::new(graph, vector, options(5));

        assert_eq!(retriever.get_context("anything").await.unwrap(), "");
    }
}
