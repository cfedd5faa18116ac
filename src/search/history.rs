// file: src/search/history.rs
// description: search history logging on top of the metadata store
// reference: json file persistence with an in-memory cache

use crate::database::MetadataStore;
use crate::error::Result;
use crate::models::{SearchHistoryEntry, SearchResult};
use crate::search::types::SearchType;
use uuid::Uuid;

pub async fn log_query(
    store: &mut MetadataStore,
    user_id: Uuid,
    query_type: SearchType,
    query_text: &str,
) -> Result<()> {
    store.push_history(SearchHistoryEntry::query(user_id, query_type, query_text));
    store.save().await
}

/// Stores the result texts as a JSON array.
pub async fn log_result(
    store: &mut MetadataStore,
    user_id: Uuid,
    query_type: SearchType,
    results: &[SearchResult],
) -> Result<()> {
    let texts: Vec<&str> = results.iter().map(SearchResult::text).collect();
    let text = serde_json::to_string(&texts)?;
    store.push_history(SearchHistoryEntry::result(user_id, query_type, text));
    store.save().await
}

pub fn get_history(
    store: &MetadataStore,
    user_id: &Uuid,
    limit: Option<usize>,
) -> Vec<SearchHistoryEntry> {
    store.history(user_id, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_query_and_result_are_logged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("metadata.json");
        let mut store = MetadataStore::open(path.clone()).await.unwrap();
        let user = Uuid::new_v4();
        let results = vec![SearchResult::new(
            Uuid::new_v4(),
            0.9,
            None,
            json!({"text": "qubits"}),
        )];

        log_query(&mut store, user, SearchType::Chunks, "what is a qubit")
            .await
            .unwrap();
        log_result(&mut store, user, SearchType::Chunks, &results)
            .await
            .unwrap();

        let reopened = MetadataStore::open(path).await.unwrap();
        let history = get_history(&reopened, &user, None);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, HistoryKind::Query);
        assert_eq!(history[0].text, "what is a qubit");
        assert_eq!(history[1].kind, HistoryKind::Result);
        assert_eq!(history[1].text, "[\"qubits\"]");
    }
}
