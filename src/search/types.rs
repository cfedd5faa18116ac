// file: src/search/types.rs
// description: search types and search requests
// reference: internal data structures

use crate::error::MemoryError;
use crate::models::{NodeType, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchType {
    /// Entity matches expanded to their graph connections.
    Insights,
    Chunks,
    Summaries,
    /// Node and connection context for the query, rendered as one result.
    GraphCompletion,
}

impl SearchType {
    pub const ALL: [SearchType; 4] = [
        SearchType::Insights,
        SearchType::Chunks,
        SearchType::Summaries,
        SearchType::GraphCompletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insights => "INSIGHTS",
            Self::Chunks => "CHUNKS",
            Self::Summaries => "SUMMARIES",
            Self::GraphCompletion => "GRAPH_COMPLETION",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        SearchType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| MemoryError::Validation(format!("Unknown search type: {}", s)))
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query_type: SearchType,
    pub query_text: String,
    /// Searching user; the default user when unset.
    pub user: Option<User>,
    /// Falls back to `search.top_k` when unset.
    pub top_k: Option<usize>,
    pub node_type: Option<NodeType>,
    pub node_names: Vec<String>,
}

impl SearchRequest {
    pub fn new(query_type: SearchType, query_text: impl Into<String>) -> Self {
        Self {
            query_type,
            query_text: query_text.into(),
            user: None,
            top_k: None,
            node_type: None,
            node_names: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Restricts graph context to the subgraph around nodes of `node_type` named in `names`.
    pub fn with_node_set(mut self, node_type: NodeType, names: Vec<String>) -> Self {
        self.node_type = Some(node_type);
        self.node_names = names;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_parsing() {
        assert_eq!(
            "graph-completion".parse::<SearchType>().unwrap(),
            SearchType::GraphCompletion
        );
        assert_eq!("insights".parse::<SearchType>().unwrap(), SearchType::Insights);
        assert_eq!("CHUNKS".parse::<SearchType>().unwrap(), SearchType::Chunks);
        assert!("answers".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_search_type_serialization() {
        let json = serde_json::to_string(&SearchType::GraphCompletion).unwrap();
        assert_eq!(json, "\"GRAPH_COMPLETION\"");
        assert_eq!(SearchType::Summaries.to_string(), "SUMMARIES");
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new(SearchType::Chunks, "qubits")
            .with_top_k(3)
            .with_node_set(NodeType::NodeSet, vec!["first".to_string()]);

        assert_eq!(request.top_k, Some(3));
        assert_eq!(request.node_type, Some(NodeType::NodeSet));
        assert_eq!(request.node_names, vec!["first"]);
        assert!(request.user.is_none());
    }
}
