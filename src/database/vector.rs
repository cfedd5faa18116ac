// file: src/database/vector.rs
// description: vector engine abstraction with LanceDB and in-process implementations
// reference: https://docs.rs/lancedb

use crate::config::VectorProvider;
use crate::database::client::LanceDbClient;
use crate::database::embeddings::{Embedder, cosine_similarity};
use crate::database::insert::BatchInserter;
use crate::database::schema::SchemaManager;
use crate::error::Result;
use crate::models::SearchResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// A piece of text indexed into a vector collection.
#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub id: Uuid,
    pub text: String,
    pub payload: Value,
}

impl IndexPoint {
    pub fn new(id: Uuid, text: &str, payload: Value) -> Self {
        Self {
            id,
            text: text.to_string(),
            payload,
        }
    }
}

#[async_trait]
pub trait VectorEngine: Send + Sync {
    fn provider(&self) -> VectorProvider;

    fn embedder(&self) -> &Embedder;

    async fn has_collection(&self, collection: &str) -> Result<bool>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Inserts points, replacing any existing point with the same id.
    async fn create_data_points(&self, collection: &str, points: Vec<IndexPoint>) -> Result<usize>;

    /// Top `limit` points of `collection` for `query_text`, best first. Missing collections yield nothing.
    async fn search(&self, collection: &str, query_text: &str, limit: usize)
    -> Result<Vec<SearchResult>>;

    async fn delete_data_points(&self, collection: &str, ids: &[Uuid]) -> Result<()>;

    /// Drops every collection.
    async fn prune(&self) -> Result<()>;
}

pub struct LanceDbVectorEngine {
    client: LanceDbClient,
    embedder: Arc<Embedder>,
    // table creation and merge upserts on one collection must not interleave
    writes: Mutex<()>,
}

impl LanceDbVectorEngine {
    pub async fn open(uri: &str, embedder: Arc<Embedder>) -> Result<Self> {
        let client = LanceDbClient::new(uri).await?;
        client.ping().await?;
        Ok(Self {
            client,
            embedder,
            writes: Mutex::new(()),
        })
    }

    pub fn client(&self) -> &LanceDbClient {
        &self.client
    }
}

#[async_trait]
impl VectorEngine for LanceDbVectorEngine {
    fn provider(&self) -> VectorProvider {
        VectorProvider::LanceDb
    }

    fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    async fn has_collection(&self, collection: &str) -> Result<bool> {
        SchemaManager::new(&self.client)
            .verify_collection(collection)
            .await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = self.client.table_names().await?;
        names.sort();
        Ok(names)
    }

    async fn create_data_points(&self, collection: &str, points: Vec<IndexPoint>) -> Result<usize> {
        let points = dedupe_points(points);
        let texts: Vec<String> = points.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let _guard = self.writes.lock().await;
        let inserter = BatchInserter::new(&self.client, self.embedder.dimensions());
        let stats = inserter.upsert_points(collection, &points, embeddings).await?;
        Ok(stats.points_inserted)
    }

    async fn search(
        &self,
        collection: &str,
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query_text).await?;
        self.client.vector_search(collection, embedding, limit).await
    }

    async fn delete_data_points(&self, collection: &str, ids: &[Uuid]) -> Result<()> {
        let _guard = self.writes.lock().await;
        self.client.delete_ids(collection, ids).await
    }

    async fn prune(&self) -> Result<()> {
        let _guard = self.writes.lock().await;
        SchemaManager::new(&self.client).drop_all_tables().await?;
        Ok(())
    }
}

struct StoredPoint {
    point: IndexPoint,
    embedding: Vec<f32>,
}

/// Collections held in process memory; scores are cosine similarities.
pub struct MemoryVectorEngine {
    collections: RwLock<HashMap<String, Vec<StoredPoint>>>,
    embedder: Arc<Embedder>,
}

impl MemoryVectorEngine {
    pub fn new(embedder: Arc<Embedder>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            embedder,
        }
    }
}

#[async_trait]
impl VectorEngine for MemoryVectorEngine {
    fn provider(&self) -> VectorProvider {
        VectorProvider::Memory
    }

    fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    async fn has_collection(&self, collection: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_data_points(&self, collection: &str, points: Vec<IndexPoint>) -> Result<usize> {
        let points = dedupe_points(points);
        let texts: Vec<String> = points.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let inserted = points.len();

        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();
        for (point, embedding) in points.into_iter().zip(embeddings) {
            stored.retain(|existing| existing.point.id != point.id);
            stored.push(StoredPoint { point, embedding });
        }

        debug!("Upserted {} points into {}", inserted, collection);
        Ok(inserted)
    }

    async fn search(
        &self,
        collection: &str,
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query = self.embedder.embed(query_text).await?;
        let collections = self.collections.read().await;
        let Some(stored) = collections.get(collection) else {
            debug!("Collection {} does not exist, returning empty results", collection);
            return Ok(Vec::new());
        };

        let mut results: Vec<SearchResult> = stored
            .iter()
            .map(|entry| {
                let score = cosine_similarity(&query, &entry.embedding);
                SearchResult::new(
                    entry.point.id,
                    score,
                    Some(1.0 - score),
                    entry.point.payload.clone(),
                )
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        Ok(results)
    }

    async fn delete_data_points(&self, collection: &str, ids: &[Uuid]) -> Result<()> {
        if let Some(stored) = self.collections.write().await.get_mut(collection) {
            stored.retain(|entry| !ids.contains(&entry.point.id));
        }
        Ok(())
    }

    async fn prune(&self) -> Result<()> {
        let mut collections = self.collections.write().await;
        info!("Dropping {} in-memory collections", collections.len());
        collections.clear();
        Ok(())
    }
}

/// Keeps the last point for every id.
fn dedupe_points(points: Vec<IndexPoint>) -> Vec<IndexPoint> {
    let mut positions: HashMap<Uuid, usize> = HashMap::new();
    let mut unique: Vec<IndexPoint> = Vec::with_capacity(points.len());
    for point in points {
        match positions.get(&point.id) {
            Some(&idx) => unique[idx] = point,
            None => {
                positions.insert(point.id, unique.len());
                unique.push(point);
            }
        }
    }
    unique
}
