// file: src/database/schema.rs
// description: LanceDB schema management for vector collections
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::error::Result;
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SchemaManager<'a> {
    client: &'a LanceDbClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    pub async fn verify_collection(&self, collection: &str) -> Result<bool> {
        if !self.client.table_exists(collection).await? {
            warn!("Collection '{}' does not exist", collection);
            return Ok(false);
        }

        Ok(true)
    }

    /// Arrow schema shared by every collection table
    pub fn get_collection_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            // JSON encoded payload returned with search hits
            Field::new("payload", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    pub async fn drop_all_tables(&self) -> Result<usize> {
        warn!("Dropping all collections in LanceDB");

        let table_names = self.client.table_names().await?;
        for table_name in &table_names {
            self.client.drop_table(table_name).await?;
        }

        info!("Dropped {} collections", table_names.len());
        Ok(table_names.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema = SchemaManager::get_collection_schema(384);
        assert_eq!(schema.fields().len(), 4);

        let vector_field = schema.field_with_name("vector").unwrap();
        assert!(matches!(vector_field.data_type(), DataType::FixedSizeList(_, 384)));
    }
}
