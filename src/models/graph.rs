// file: src/models/graph.rs
// description: knowledge graph nodes, edges and triplets
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MemoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    TextDocument,
    DocumentChunk,
    Entity,
    EntityType,
    TextSummary,
    NodeSet,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::TextDocument,
        NodeType::DocumentChunk,
        NodeType::Entity,
        NodeType::EntityType,
        NodeType::TextSummary,
        NodeType::NodeSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextDocument => "TextDocument",
            Self::DocumentChunk => "DocumentChunk",
            Self::Entity => "Entity",
            Self::EntityType => "EntityType",
            Self::TextSummary => "TextSummary",
            Self::NodeSet => "NodeSet",
        }
    }

    /// Field embedded into the vector store for nodes of this type.
    pub fn index_field(&self) -> &'static str {
        match self {
            Self::DocumentChunk | Self::TextSummary => "text",
            _ => "name",
        }
    }

    /// Vector collection name, e.g. `Entity_name`.
    pub fn collection(&self) -> String {
        format!("{}_{}", self.as_str(), self.index_field())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MemoryError::Validation(format!("Unknown node type: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    pub node_type: NodeType,
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Node {
    pub fn new(node_type: NodeType, key: &str, name: impl Into<String>) -> Self {
        Self {
            id: Self::derive_id(node_type, key),
            node_type,
            name: name.into(),
            text: None,
            properties: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Deterministic id so that re-processing the same content upserts.
    pub fn derive_id(node_type: NodeType, key: &str) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}:{}", node_type.as_str(), key).as_bytes(),
        )
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// The text embedded for this node's vector collection.
    pub fn index_text(&self) -> &str {
        match self.node_type.index_field() {
            "text" => self.text.as_deref().unwrap_or(&self.name),
            _ => &self.name,
        }
    }

    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("id".to_string(), Value::String(self.id.to_string()));
        payload.insert(
            "type".to_string(),
            Value::String(self.node_type.as_str().to_string()),
        );
        payload.insert("name".to_string(), Value::String(self.name.clone()));
        payload.insert("text".to_string(), Value::String(self.index_text().to_string()));
        for (key, value) in &self.properties {
            payload.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: Uuid,
    pub target: Uuid,
    pub relationship: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Edge {
    pub fn new(source: Uuid, target: Uuid, relationship: impl Into<String>) -> Self {
        Self {
            source,
            target,
            relationship: relationship.into(),
            properties: Map::new(),
        }
    }

    pub fn key(&self) -> (Uuid, Uuid, &str) {
        (self.source, self.target, self.relationship.as_str())
    }

    pub fn touches(&self, id: &Uuid) -> bool {
        &self.source == id || &self.target == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triplet {
    pub source: Node,
    pub edge: Edge,
    pub target: Node,
}

impl Triplet {
    pub fn describe(&self) -> String {
        format!(
            "{} --[{}]--> {}",
            self.source.name, self.edge.relationship, self.target.name
        )
    }
}
