// file: src/ingestion/ingest.rs
// description: registers text and files as data items of a dataset
// reference: content-addressed raw storage under the data root

use crate::config::Config;
use crate::database::MetadataStore;
use crate::error::{MemoryError, Result};
use crate::ingestion::classifier::FileClassifier;
use crate::ingestion::scanner::FileScanner;
use crate::ingestion::source::DataSource;
use crate::models::{Data, User};
use crate::utils::validation::Validator;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

struct PreparedItem {
    name: String,
    extension: String,
    mime_type: String,
    location: String,
    content: String,
}

pub struct Ingestor {
    data_root: PathBuf,
    scanner: FileScanner,
    classifier: FileClassifier,
}

impl Ingestor {
    pub fn new(config: &Config) -> Self {
        Self {
            data_root: config.storage.data_root_directory.clone(),
            scanner: FileScanner::new(&config.pipeline),
            classifier: FileClassifier::new(),
        }
    }

    /// Adds every source to `dataset_name`, creating the dataset on first use.
    /// Re-adding identical content merges node-set tags instead of duplicating rows.
    pub async fn add(
        &self,
        store: &mut MetadataStore,
        sources: &[DataSource],
        dataset_name: &str,
        node_set: &[String],
        owner: &User,
    ) -> Result<Vec<Data>> {
        Validator::validate_dataset_name(dataset_name)?;
        if sources.is_empty() {
            return Err(MemoryError::Validation(
                "No data sources provided".to_string(),
            ));
        }

        let mut prepared = Vec::new();
        for source in sources {
            prepared.extend(self.prepare(source).await?);
        }

        if prepared.is_empty() {
            return Err(MemoryError::Ingestion(
                "No ingestible content found in the provided sources".to_string(),
            ));
        }

        let dataset = store.ensure_dataset(owner.id, dataset_name.trim());
        let mut added = Vec::with_capacity(prepared.len());

        for item in prepared {
            let mut data = Data::new(
                item.name,
                item.extension,
                item.mime_type,
                item.location,
                &item.content,
                owner.id,
            );
            data.merge_node_set(node_set);
            let stored = store.upsert_data(&dataset.id, data)?;
            debug!("Registered data {} ({})", stored.name, stored.id);
            added.push(stored);
        }

        store.save().await?;

        info!(
            "Added {} item(s) to dataset '{}'",
            added.len(),
            dataset.name
        );
        Ok(added)
    }

    async fn prepare(&self, source: &DataSource) -> Result<Vec<PreparedItem>> {
        match source {
            DataSource::Text(text) => Ok(vec![self.prepare_text(text).await?]),
            DataSource::File(path) => Ok(vec![self.prepare_file(path).await?]),
            DataSource::Directory(path) => {
                let mut items = Vec::new();
                for file in self.scanner.scan_directory(path)? {
                    match self.prepare_file(&file.path).await {
                        Ok(item) => items.push(item),
                        Err(MemoryError::Validation(reason)) => {
                            debug!("Skipping {}: {}", file.relative_path, reason);
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(items)
            }
        }
    }

    /// Persists raw text as `<data_root>/text_<sha256>.txt`.
    async fn prepare_text(&self, text: &str) -> Result<PreparedItem> {
        Validator::validate_content_not_empty(text)?;

        let hash = Data::compute_hash(text);
        let name = format!("text_{}", hash);
        let location = self.data_root.join(format!("{}.txt", name));

        fs::create_dir_all(&self.data_root)
            .await
            .map_err(|e| MemoryError::file(&self.data_root, e))?;

        if !fs::try_exists(&location).await.unwrap_or(false) {
            fs::write(&location, text)
                .await
                .map_err(|e| MemoryError::file(&location, e))?;
            debug!("Stored text at {}", location.display());
        }

        Ok(PreparedItem {
            name,
            extension: "txt".to_string(),
            mime_type: "text/plain".to_string(),
            location: location.to_string_lossy().to_string(),
            content: text.to_string(),
        })
    }

    async fn prepare_file(&self, path: &Path) -> Result<PreparedItem> {
        Validator::validate_file_path(path)?;
        let (extension, mime_type) = self.classifier.classify(path)?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| MemoryError::file(path, e))?;
        Validator::validate_content_not_empty(&content)?;

        let location = fs::canonicalize(path)
            .await
            .map_err(|e| MemoryError::file(path, e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
            .to_string();

        Ok(PreparedItem {
            name,
            extension,
            mime_type,
            location: location.to_string_lossy().to_string(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_USER_EMAIL;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default_config();
        config.storage.data_root_directory = root.join("data");
        config.storage.system_root_directory = root.join("system");
        config
    }

    async fn setup(root: &Path) -> (Ingestor, MetadataStore, User) {
        let config = test_config(root);
        let mut store = MetadataStore::open(config.metadata_file_path()).await.unwrap();
        let user = store.get_or_create_user(DEFAULT_USER_EMAIL).await.unwrap();
        (Ingestor::new(&config), store, user)
    }

    #[tokio::test]
    async fn test_add_text_writes_raw_file() {
        let temp = TempDir::new().unwrap();
        let (ingestor, mut store, user) = setup(temp.path()).await;

        let added = ingestor
            .add(
                &mut store,
                &[DataSource::Text("Qubits can hold superpositions.".to_string())],
                "cs_explanations",
                &[],
                &user,
            )
            .await
            .unwrap();

        assert_eq!(added.len(), 1);
        let location = PathBuf::from(&added[0].raw_data_location);
        assert!(location.starts_with(temp.path().join("data")));
        assert!(location.file_name().unwrap().to_str().unwrap().starts_with("text_"));
        assert_eq!(
            std::fs::read_to_string(location).unwrap(),
            "Qubits can hold superpositions."
        );
    }

    #[tokio::test]
    async fn test_add_same_text_twice_merges_node_sets() {
        let temp = TempDir::new().unwrap();
        let (ingestor, mut store, user) = setup(temp.path()).await;
        let source = [DataSource::Text("Same content.".to_string())];

        ingestor
            .add(&mut store, &source, "main", &["first".to_string()], &user)
            .await
            .unwrap();
        let second = ingestor
            .add(&mut store, &source, "main", &["second".to_string()], &user)
            .await
            .unwrap();

        assert_eq!(store.data_count(), 1);
        assert_eq!(second[0].node_set, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_add_file_and_directory() {
        let temp = TempDir::new().unwrap();
        let (ingestor, mut store, user) = setup(temp.path()).await;

        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("nlp.txt"), "Natural language processing.").unwrap();
        std::fs::write(docs.join("notes.md"), "Some notes.").unwrap();
        std::fs::write(docs.join("blank.txt"), "   ").unwrap();

        let added = ingestor
            .add(
                &mut store,
                &[DataSource::Directory(docs.clone())],
                "main",
                &[],
                &user,
            )
            .await
            .unwrap();

        assert_eq!(added.len(), 2);
        assert!(added.iter().any(|d| d.name == "nlp" && d.mime_type == "text/plain"));
        assert!(added.iter().any(|d| d.extension == "md"));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let temp = TempDir::new().unwrap();
        let (ingestor, mut store, user) = setup(temp.path()).await;

        let empty = ingestor.add(&mut store, &[], "main", &[], &user).await;
        assert!(matches!(empty, Err(MemoryError::Validation(_))));

        let blank = ingestor
            .add(&mut store, &[DataSource::Text("  ".to_string())], "main", &[], &user)
            .await;
        assert!(matches!(blank, Err(MemoryError::Validation(_))));

        let bad_name = ingestor
            .add(&mut store, &[DataSource::Text("x".to_string())], "a/b", &[], &user)
            .await;
        assert!(matches!(bad_name, Err(MemoryError::Validation(_))));
        assert_eq!(store.data_count(), 0);
    }
}
