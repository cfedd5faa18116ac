// file: src/models/search_result.rs
// description: Search result model with similarity scores
// reference: Used for vector similarity and graph search results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Id of the indexed data point or graph node
    pub id: Uuid,

    /// Similarity score (higher is more similar, typically 0.0-1.0)
    pub score: f32,

    /// Optional: Distance metric (lower is more similar)
    pub distance: Option<f32>,

    /// Stored payload; always carries a `text` field
    pub payload: Value,
}

impl SearchResult {
    pub fn new(id: Uuid, score: f32, distance: Option<f32>, payload: Value) -> Self {
        Self {
            id,
            score,
            distance,
            payload,
        }
    }

    pub fn text(&self) -> &str {
        self.payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let text = self.text();
        let content_preview = match text.char_indices().nth(max_content_len) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        };

        format!("Score: {:.4} | {}\n{}\n", self.score, self.id, content_preview)
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_result_creation() {
        let id = Uuid::new_v4();
        let result = SearchResult::new(id, 0.95, Some(0.05), json!({"text": "qubit"}));

        assert_eq!(result.score, 0.95);
        assert_eq!(result.distance, Some(0.05));
        assert_eq!(result.text(), "qubit");
    }

    #[test]
    fn test_missing_text_is_empty() {
        let result = SearchResult::new(Uuid::new_v4(), 1.0, None, json!({"name": "x"}));
        assert_eq!(result.text(), "");
    }

    #[test]
    fn test_format_summary() {
        let result = SearchResult::new(
            Uuid::new_v4(),
            0.87,
            None,
            json!({"text": "This is a very long content that will be truncated"}),
        );

        let summary = result.format_summary(20);
        assert!(summary.contains("0.8700"));
        assert!(summary.contains("This is a very long "));
        assert!(summary.contains("..."));
    }
}
