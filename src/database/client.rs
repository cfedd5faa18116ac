// file: src/database/client.rs
// description: LanceDB client wrapper with connection management
// reference: https://docs.rs/lancedb

use crate::error::{MemoryError, Result};
use crate::models::SearchResult;
use arrow_array::{Array, Float32Array, StringArray};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table, connect};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    uri: String,
}

impl LanceDbClient {
    pub async fn new(uri: &str) -> Result<Self> {
        info!("Connecting to LanceDB at {}", uri);

        if !uri.contains("://") {
            tokio::fs::create_dir_all(Path::new(uri))
                .await
                .map_err(|e| MemoryError::file(uri, e))?;
        }

        let connection = connect(uri)
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            uri: uri.to_string(),
        })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        match self.connection.table_names().execute().await {
            Ok(_) => Ok(true),
            Err(e) => Err(MemoryError::Database(format!(
                "LanceDB connection failed: {}",
                e
            ))),
        }
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to list tables: {}", e)))
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self.table_names().await?;
        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                MemoryError::Database(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    pub async fn count_rows(&self, table_name: &str) -> Result<u64> {
        if !self.table_exists(table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(table_name).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    pub async fn drop_table(&self, table_name: &str) -> Result<()> {
        self.connection.drop_table(table_name).await.map_err(|e| {
            MemoryError::Database(format!("Failed to drop table {}: {}", table_name, e))
        })?;
        info!("Dropped table: {}", table_name);
        Ok(())
    }

    /// Delete rows whose `id` is one of `ids`
    pub async fn delete_ids(&self, table_name: &str, ids: &[Uuid]) -> Result<()> {
        if ids.is_empty() || !self.table_exists(table_name).await? {
            return Ok(());
        }

        let table = self.get_table(table_name).await?;
        let predicate = id_predicate(ids);

        debug!("Deleting rows from {} with predicate: {}", table_name, predicate);

        table.delete(&predicate).await.map_err(|e| {
            MemoryError::Database(format!(
                "Failed to delete rows from {}: {}",
                table_name, e
            ))
        })?;

        Ok(())
    }

    /// Search a collection table by vector similarity
    ///
    /// # Returns
    /// Vector of SearchResult ordered by similarity (highest first)
    pub async fn vector_search(
        &self,
        table_name: &str,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if !self.table_exists(table_name).await? {
            warn!("Table {} does not exist, returning empty results", table_name);
            return Ok(Vec::new());
        }

        let table = self.get_table(table_name).await?;

        debug!("Performing vector search on {} with limit {}", table_name, limit);

        let mut results_stream = table
            .vector_search(query_embedding)
            .map_err(|e| MemoryError::Database(format!("Failed to create vector search: {}", e)))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Vector search failed: {}", e)))?;

        let mut search_results = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                MemoryError::Database(format!("Failed to read result batch: {}", e))
            })?;

            let ids = string_column(&batch, "id")?;
            let payloads = string_column(&batch, "payload")?;

            // LanceDB returns distance score in a special column
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let id = Uuid::parse_str(ids.value(i)).map_err(|e| {
                    MemoryError::Database(format!("Invalid id {}: {}", ids.value(i), e))
                })?;
                let payload = serde_json::from_str(payloads.value(i))?;

                // Lower distance means higher similarity
                let (score, distance) = match distances {
                    Some(dist_array) => {
                        let dist = dist_array.value(i);
                        (1.0 / (1.0 + dist), Some(dist))
                    }
                    None => (1.0, None),
                };

                search_results.push(SearchResult::new(id, score, distance, payload));
            }
        }

        debug!(
            "Vector search on {} returned {} results",
            table_name,
            search_results.len()
        );
        Ok(search_results)
    }
}

fn string_column<'a>(
    batch: &'a arrow_array::RecordBatch,
    name: &str,
) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| MemoryError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| MemoryError::Database(format!("Invalid '{}' column type", name)))
}

fn id_predicate(ids: &[Uuid]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("'{}'", id)).collect();
    format!("id IN ({})", quoted.join(", "))
}
