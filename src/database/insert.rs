// file: src/database/insert.rs
// description: LanceDB batch upserts of indexed data points with vector embeddings
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::database::schema::SchemaManager;
use crate::database::vector::IndexPoint;
use crate::error::{MemoryError, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use std::sync::Arc;
use tracing::{debug, info};

pub struct BatchInserter<'a> {
    client: &'a LanceDbClient,
    embedding_dim: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InsertStats {
    pub points_inserted: usize,
    /// False when the write created the table.
    pub merged: bool,
}

impl<'a> BatchInserter<'a> {
    pub fn new(client: &'a LanceDbClient, embedding_dim: usize) -> Self {
        Self {
            client,
            embedding_dim,
        }
    }

    /// Upsert points into a collection table, creating the table on first write
    pub async fn upsert_points(
        &self,
        collection: &str,
        points: &[IndexPoint],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<InsertStats> {
        let mut stats = InsertStats::default();
        if points.is_empty() {
            return Ok(stats);
        }

        let schema = SchemaManager::get_collection_schema(self.embedding_dim);
        let record_batch =
            Self::create_record_batch(schema.clone(), points, embeddings, self.embedding_dim)?;

        if !self.client.table_exists(collection).await? {
            self.client
                .get_connection()
                .create_table(
                    collection,
                    RecordBatchIterator::new(vec![Ok(record_batch)], schema.clone()),
                )
                .execute()
                .await
                .map_err(|e| {
                    MemoryError::Database(format!("Failed to create table {}: {}", collection, e))
                })?;
            info!("Created new collection: {}", collection);
        } else {
            let table = self.client.get_table(collection).await?;
            let mut merge = table.merge_insert(&["id"]);
            merge
                .when_matched_update_all(None)
                .when_not_matched_insert_all();
            merge
                .execute(Box::new(RecordBatchIterator::new(
                    vec![Ok(record_batch)],
                    schema,
                )))
                .await
                .map_err(|e| {
                    MemoryError::Database(format!(
                        "Failed to upsert into collection {}: {}",
                        collection, e
                    ))
                })?;
            stats.merged = true;
        }

        stats.points_inserted = points.len();
        debug!("Upserted {} points into {}", points.len(), collection);
        Ok(stats)
    }

    /// Create an Arrow RecordBatch from points and their embeddings
    fn create_record_batch(
        schema: Arc<arrow_schema::Schema>,
        points: &[IndexPoint],
        embeddings: Vec<Vec<f32>>,
        embedding_dim: usize,
    ) -> Result<RecordBatch> {
        if points.len() != embeddings.len() {
            return Err(MemoryError::Database(format!(
                "Got {} embeddings for {} points",
                embeddings.len(),
                points.len()
            )));
        }

        if let Some(bad) = embeddings.iter().find(|e| e.len() != embedding_dim) {
            return Err(MemoryError::Embedding(format!(
                "Embedding dimension {} does not match collection dimension {}",
                bad.len(),
                embedding_dim
            )));
        }

        let ids: StringArray = points.iter().map(|p| Some(p.id.to_string())).collect();
        let texts: StringArray = points.iter().map(|p| Some(p.text.clone())).collect();
        let payloads: StringArray = points
            .iter()
            .map(|p| Some(p.payload.to_string()))
            .collect();

        let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            embeddings
                .into_iter()
                .map(|emb| Some(emb.into_iter().map(Some).collect::<Vec<_>>())),
            embedding_dim as i32,
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(texts),
                Arc::new(payloads),
                Arc::new(vectors),
            ],
        )
        .map_err(|e| MemoryError::Database(format!("Failed to create record batch: {}", e)))
    }
}
