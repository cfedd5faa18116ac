// file: src/database/graph.rs
// description: graph engine abstraction with in-process and json-file implementations
// reference: knowledge graph persistence patterns

use crate::config::GraphProvider;
use crate::error::{MemoryError, Result};
use crate::models::{Edge, Node, NodeType, Triplet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait GraphEngine: Send + Sync {
    fn provider(&self) -> GraphProvider;

    /// Inserts nodes or merges them into existing nodes with the same id.
    async fn add_nodes(&self, nodes: Vec<Node>) -> Result<()>;

    /// Adds edges; duplicates of an existing (source, target, relationship) are ignored.
    async fn add_edges(&self, edges: Vec<Edge>) -> Result<()>;

    async fn get_node(&self, id: Uuid) -> Result<Option<Node>>;

    async fn get_nodes(&self, ids: &[Uuid]) -> Result<Vec<Node>>;

    /// Every edge touching `id`, resolved to full triplets.
    async fn get_connections(&self, id: Uuid) -> Result<Vec<Triplet>>;

    async fn get_graph_data(&self) -> Result<(Vec<Node>, Vec<Edge>)>;

    /// Nodes of `node_type` named in `names`, their direct neighbours, and the edges among them.
    async fn get_nodeset_subgraph(
        &self,
        node_type: NodeType,
        names: &[String],
    ) -> Result<(Vec<Node>, Vec<Edge>)>;

    async fn delete_nodes(&self, ids: &[Uuid]) -> Result<()>;

    async fn delete_graph(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Adjacency-free graph state shared by both engines.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: HashMap<Uuid, Node>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(Uuid, Uuid, String)>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut store = Self::new();
        store.upsert_nodes(snapshot.nodes);
        if let Err(e) = store.insert_edges(snapshot.edges) {
            warn!("Dropping dangling edges while loading graph: {}", e);
        }
        store
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        GraphSnapshot {
            nodes,
            edges: self.edges.clone(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn upsert_nodes(&mut self, nodes: Vec<Node>) {
        for node in nodes {
            match self.nodes.get_mut(&node.id) {
                Some(existing) => {
                    existing.name = node.name;
                    if node.text.is_some() {
                        existing.text = node.text;
                    }
                    existing.properties.extend(node.properties);
                }
                None => {
                    self.nodes.insert(node.id, node);
                }
            }
        }
    }

    /// Inserts every edge whose endpoints exist; reports the first dangling one.
    pub fn insert_edges(&mut self, edges: Vec<Edge>) -> Result<usize> {
        let mut inserted = 0;
        let mut dangling = None;

        for edge in edges {
            if !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target) {
                dangling.get_or_insert_with(|| {
                    format!(
                        "edge {} -> {} ({}) references a missing node",
                        edge.source, edge.target, edge.relationship
                    )
                });
                continue;
            }

            let key = (edge.source, edge.target, edge.relationship.clone());
            if self.edge_keys.insert(key) {
                self.edges.push(edge);
                inserted += 1;
            }
        }

        match dangling {
            Some(message) => Err(MemoryError::Graph(message)),
            None => Ok(inserted),
        }
    }

    pub fn node(&self, id: &Uuid) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn connections(&self, id: &Uuid) -> Vec<Triplet> {
        self.edges
            .iter()
            .filter(|edge| edge.touches(id))
            .filter_map(|edge| self.triplet(edge))
            .collect()
    }

    pub fn triplet(&self, edge: &Edge) -> Option<Triplet> {
        Some(Triplet {
            source: self.nodes.get(&edge.source)?.clone(),
            edge: edge.clone(),
            target: self.nodes.get(&edge.target)?.clone(),
        })
    }

    pub fn nodeset_subgraph(&self, node_type: NodeType, names: &[String]) -> GraphSnapshot {
        let seeds: HashSet<Uuid> = self
            .nodes
            .values()
            .filter(|node| node.node_type == node_type && names.iter().any(|n| n == &node.name))
            .map(|node| node.id)
            .collect();

        if seeds.is_empty() {
            return GraphSnapshot::default();
        }

        let mut members = seeds.clone();
        for edge in &self.edges {
            if seeds.contains(&edge.source) {
                members.insert(edge.target);
            }
            if seeds.contains(&edge.target) {
                members.insert(edge.source);
            }
        }

        let mut nodes: Vec<Node> = members
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let edges = self
            .edges
            .iter()
            .filter(|edge| members.contains(&edge.source) && members.contains(&edge.target))
            .cloned()
            .collect();

        GraphSnapshot { nodes, edges }
    }

    pub fn delete_nodes(&mut self, ids: &[Uuid]) {
        for id in ids {
            self.nodes.remove(id);
        }
        self.edges
            .retain(|edge| !ids.contains(&edge.source) && !ids.contains(&edge.target));
        self.edge_keys = self
            .edges
            .iter()
            .map(|edge| (edge.source, edge.target, edge.relationship.clone()))
            .collect();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.edge_keys.clear();
    }
}

/// Graph kept in process memory for the lifetime of the engine.
#[derive(Default)]
pub struct MemoryGraphEngine {
    store: RwLock<GraphStore>,
}

impl MemoryGraphEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphEngine for MemoryGraphEngine {
    fn provider(&self) -> GraphProvider {
        GraphProvider::Memory
    }

    async fn add_nodes(&self, nodes: Vec<Node>) -> Result<()> {
        self.store.write().await.upsert_nodes(nodes);
        Ok(())
    }

    async fn add_edges(&self, edges: Vec<Edge>) -> Result<()> {
        self.store.write().await.insert_edges(edges)?;
        Ok(())
    }

    async fn get_node(&self, id: Uuid) -> Result<Option<Node>> {
        Ok(self.store.read().await.node(&id).cloned())
    }

    async fn get_nodes(&self, ids: &[Uuid]) -> Result<Vec<Node>> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.node(id).cloned()).collect())
    }

    async fn get_connections(&self, id: Uuid) -> Result<Vec<Triplet>> {
        Ok(self.store.read().await.connections(&id))
    }

    async fn get_graph_data(&self) -> Result<(Vec<Node>, Vec<Edge>)> {
        let snapshot = self.store.read().await.snapshot();
        Ok((snapshot.nodes, snapshot.edges))
    }

    async fn get_nodeset_subgraph(
        &self,
        node_type: NodeType,
        names: &[String],
    ) -> Result<(Vec<Node>, Vec<Edge>)> {
        let snapshot = self.store.read().await.nodeset_subgraph(node_type, names);
        Ok((snapshot.nodes, snapshot.edges))
    }

    async fn delete_nodes(&self, ids: &[Uuid]) -> Result<()> {
        self.store.write().await.delete_nodes(ids);
        Ok(())
    }

    async fn delete_graph(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

/// Graph persisted as a JSON document, rewritten after every mutation.
pub struct JsonGraphEngine {
    path: PathBuf,
    store: RwLock<GraphStore>,
}

impl JsonGraphEngine {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = if fs::try_exists(&path).await.unwrap_or(false) {
            let contents = fs::read_to_string(&path)
                .await
                .map_err(|e| MemoryError::file(&path, e))?;
            let snapshot: GraphSnapshot = serde_json::from_str(&contents).map_err(|e| {
                MemoryError::Graph(format!("Failed to parse graph file {:?}: {}", path, e))
            })?;
            let store = GraphStore::from_snapshot(snapshot);
            info!(
                "Loaded graph from {:?} ({} nodes, {} edges)",
                path,
                store.node_count(),
                store.edge_count()
            );
            store
        } else {
            debug!("No existing graph file found at {:?}", path);
            GraphStore::new()
        };

        Ok(Self {
            path,
            store: RwLock::new(store),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, store: &GraphStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::file(parent, e))?;
        }

        let contents = serde_json::to_string(&store.snapshot())?;
        fs::write(&self.path, contents)
            .await
            .map_err(|e| MemoryError::file(&self.path, e))?;

        debug!(
            "Saved graph with {} nodes and {} edges",
            store.node_count(),
            store.edge_count()
        );
        Ok(())
    }
}

#[async_trait]
impl GraphEngine for JsonGraphEngine {
    fn provider(&self) -> GraphProvider {
        GraphProvider::Json
    }

    async fn add_nodes(&self, nodes: Vec<Node>) -> Result<()> {
        let mut store = self.store.write().await;
        store.upsert_nodes(nodes);
        self.persist(&store).await
    }

    async fn add_edges(&self, edges: Vec<Edge>) -> Result<()> {
        let mut store = self.store.write().await;
        let outcome = store.insert_edges(edges);
        self.persist(&store).await?;
        outcome.map(|_| ())
    }

    async fn get_node(&self, id: Uuid) -> Result<Option<Node>> {
        Ok(self.store.read().await.node(&id).cloned())
    }

    async fn get_nodes(&self, ids: &[Uuid]) -> Result<Vec<Node>> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.node(id).cloned()).collect())
    }

    async fn get_connections(&self, id: Uuid) -> Result<Vec<Triplet>> {
        Ok(self.store.read().await.connections(&id))
    }

    async fn get_graph_data(&self) -> Result<(Vec<Node>, Vec<Edge>)> {
        let snapshot = self.store.read().await.snapshot();
        Ok((snapshot.nodes, snapshot.edges))
    }

    async fn get_nodeset_subgraph(
        &self,
        node_type: NodeType,
        names: &[String],
    ) -> Result<(Vec<Node>, Vec<Edge>)> {
        let snapshot = self.store.read().await.nodeset_subgraph(node_type, names);
        Ok((snapshot.nodes, snapshot.edges))
    }

    async fn delete_nodes(&self, ids: &[Uuid]) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete_nodes(ids);
        self.persist(&store).await
    }

    async fn delete_graph(&self) -> Result<()> {
        let mut store = self.store.write().await;
        store.clear();
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            fs::remove_file(&self.path)
                .await
                .map_err(|e| MemoryError::file(&self.path, e))?;
        }
        info!("Deleted graph at {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> (Vec<Node>, Vec<Edge>) {
        let set = Node::new(NodeType::NodeSet, "first", "first");
        let chunk = Node::new(NodeType::DocumentChunk, "doc:0", "chunk").with_text("Neo4j text");
        let entity = Node::new(NodeType::Entity, "neo4j", "neo4j");
        let other = Node::new(NodeType::Entity, "qubit", "qubit");
        let edges = vec![
            Edge::new(chunk.id, set.id, "belongs_to_set"),
            Edge::new(chunk.id, entity.id, "contains"),
            Edge::new(other.id, entity.id, "related_to"),
        ];
        (vec![set, chunk, entity, other], edges)
    }

    #[tokio::test]
    async fn test_memory_engine_dedupes_edges() {
        let engine = MemoryGraphEngine::new();
        let (nodes, edges) = sample();
        engine.add_nodes(nodes).await.unwrap();
        engine.add_edges(edges.clone()).await.unwrap();
        engine.add_edges(edges).await.unwrap();

        let (nodes, edges) = engine.get_graph_data().await.unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(edges.len(), 3);
    }

    #[tokio::test]
    async fn test_dangling_edge_is_rejected() {
        let engine = MemoryGraphEngine::new();
        let node = Node::new(NodeType::Entity, "a", "a");
        let id = node.id;
        engine.add_nodes(vec![node]).await.unwrap();

        let result = engine
            .add_edges(vec![Edge::new(id, Uuid::new_v4(), "related_to")])
            .await;
        assert!(matches!(result, Err(MemoryError::Graph(_))));
    }

    #[tokio::test]
    async fn test_node_upsert_merges_properties() {
        let engine = MemoryGraphEngine::new();
        let first = Node::new(NodeType::Entity, "qubit", "qubit").with_property("a", 1);
        let second = Node::new(NodeType::Entity, "qubit", "qubit").with_property("b", 2);
        let id = first.id;
        engine.add_nodes(vec![first]).await.unwrap();
        engine.add_nodes(vec![second]).await.unwrap();

        let node = engine.get_node(id).await.unwrap().unwrap();
        assert_eq!(node.properties.len(), 2);
    }

    #[tokio::test]
    async fn test_nodeset_subgraph() {
        let engine = MemoryGraphEngine::new();
        let (nodes, edges) = sample();
        engine.add_nodes(nodes).await.unwrap();
        engine.add_edges(edges).await.unwrap();

        let (nodes, edges) = engine
            .get_nodeset_subgraph(NodeType::NodeSet, &["first".to_string()])
            .await
            .unwrap();
        // seed plus the chunk; the entity is two hops away
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);

        let (nodes, edges) = engine
            .get_nodeset_subgraph(NodeType::NodeSet, &["nonexistent".to_string()])
            .await
            .unwrap();
        assert!(nodes.is_empty() && edges.is_empty());
    }

    #[tokio::test]
    async fn test_connections_and_delete() {
        let engine = MemoryGraphEngine::new();
        let (nodes, edges) = sample();
        let entity_id = nodes[2].id;
        let chunk_id = nodes[1].id;
        engine.add_nodes(nodes).await.unwrap();
        engine.add_edges(edges).await.unwrap();

        assert_eq!(engine.get_connections(entity_id).await.unwrap().len(), 2);

        engine.delete_nodes(&[chunk_id]).await.unwrap();
        let (_, edges) = engine.get_graph_data().await.unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[tokio::test]
    async fn test_json_engine_persists_and_deletes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("databases/graph.json");

        {
            let engine = JsonGraphEngine::open(&path).await.unwrap();
            let (nodes, edges) = sample();
            engine.add_nodes(nodes).await.unwrap();
            engine.add_edges(edges).await.unwrap();
        }

        let engine = JsonGraphEngine::open(&path).await.unwrap();
        let (nodes, edges) = engine.get_graph_data().await.unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(edges.len(), 3);

        engine.delete_graph().await.unwrap();
        assert!(!path.exists());
        let (nodes, edges) = engine.get_graph_data().await.unwrap();
        assert!(nodes.is_empty() && edges.is_empty());
    }
}
