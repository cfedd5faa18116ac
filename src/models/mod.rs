// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod graph;
pub mod history;
pub mod search_result;
pub mod user;

pub use document::{Data, DataStatus, Dataset};
pub use graph::{Edge, Node, NodeType, Triplet};
pub use history::{HistoryKind, SearchHistoryEntry};
pub use search_result::SearchResult;
pub use user::{DEFAULT_USER_EMAIL, User};
