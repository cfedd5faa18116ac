// file: src/models/history.rs
// description: per-user search history entries (queries and their results)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::SearchType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Query,
    Result,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub query_type: SearchType,
    pub kind: HistoryKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn query(user_id: Uuid, query_type: SearchType, text: &str) -> Self {
        Self::new(user_id, query_type, HistoryKind::Query, text.to_string())
    }

    pub fn result(user_id: Uuid, query_type: SearchType, text: String) -> Self {
        Self::new(user_id, query_type, HistoryKind::Result, text)
    }

    fn new(user_id: Uuid, query_type: SearchType, kind: HistoryKind, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            query_type,
            kind,
            text,
            created_at: Utc::now(),
        }
    }
}
