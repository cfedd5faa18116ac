// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{MemoryError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub graph: GraphConfig,
    pub vector: VectorConfig,
    pub pipeline: PipelineConfig,
    pub extraction: ExtractionConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageConfig {
    pub data_root_directory: PathBuf,
    pub system_root_directory: PathBuf,
}

impl StorageConfig {
    /// Directory holding every persisted database file.
    pub fn databases_directory(&self) -> PathBuf {
        self.system_root_directory.join("databases")
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphProvider {
    Memory,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorProvider {
    LanceDb,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    pub provider: GraphProvider,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorConfig {
    pub provider: VectorProvider,
    /// Overrides the LanceDB location; defaults to `<system_root>/databases/vectors.lancedb`.
    #[serde(default)]
    pub uri: Option<String>,
    pub embedding_dimensions: usize,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    pub max_chunk_words: usize,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
    #[serde(default)]
    pub show_progress: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    pub normalize_text: bool,
    pub max_entities_per_chunk: usize,
    pub min_term_frequency: usize,
    pub summary_sentences: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub triplet_candidates: usize,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&Self::default_config())
                .map_err(|e| MemoryError::Config(e.to_string()))?,
        );

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GRAPH_MEMORY")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| MemoryError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| MemoryError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            storage: StorageConfig {
                data_root_directory: PathBuf::from(".data_storage"),
                system_root_directory: PathBuf::from(".system"),
            },
            graph: GraphConfig {
                provider: GraphProvider::Json,
                file_name: "graph.json".to_string(),
            },
            vector: VectorConfig {
                provider: VectorProvider::LanceDb,
                uri: None,
                embedding_dimensions: 256,
                groq_api_key: None,
                groq_model: "nomic-embed-text-v1_5".to_string(),
            },
            pipeline: PipelineConfig {
                parallel_workers: 4,
                max_chunk_words: 160,
                skip_patterns: vec![
                    "*.zip".to_string(),
                    "*.pdf".to_string(),
                    ".git/".to_string(),
                ],
                max_file_size_mb: 10,
                show_progress: false,
            },
            extraction: ExtractionConfig {
                normalize_text: true,
                max_entities_per_chunk: 12,
                min_term_frequency: 3,
                summary_sentences: 2,
            },
            search: SearchConfig {
                top_k: 5,
                triplet_candidates: 100,
            },
        }
    }

    /// Location of the LanceDB database, honouring an explicit `vector.uri`.
    pub fn vector_uri(&self) -> String {
        self.vector.uri.clone().unwrap_or_else(|| {
            self.storage
                .databases_directory()
                .join("vectors.lancedb")
                .display()
                .to_string()
        })
    }

    pub fn graph_file_path(&self) -> PathBuf {
        self.storage.databases_directory().join(&self.graph.file_name)
    }

    pub fn metadata_file_path(&self) -> PathBuf {
        self.storage.databases_directory().join("metadata.json")
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(MemoryError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_chunk_words == 0 {
            return Err(MemoryError::Config(
                "max_chunk_words must be greater than 0".to_string(),
            ));
        }

        if !(8..=4096).contains(&self.vector.embedding_dimensions) {
            return Err(MemoryError::Config(format!(
                "embedding_dimensions must be within 8..=4096, got {}",
                self.vector.embedding_dimensions
            )));
        }

        if self.search.top_k == 0 {
            return Err(MemoryError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if self.search.triplet_candidates < self.search.top_k {
            return Err(MemoryError::Config(format!(
                "triplet_candidates ({}) must be at least top_k ({})",
                self.search.triplet_candidates, self.search.top_k
            )));
        }

        Ok(())
    }
}

impl FromStr for GraphProvider {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "json" | "file" => Ok(Self::Json),
            other => Err(MemoryError::Config(format!(
                "Unsupported graph database provider: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for GraphProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for VectorProvider {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lancedb" | "lance" => Ok(Self::LanceDb),
            "memory" => Ok(Self::Memory),
            other => Err(MemoryError::Config(format!(
                "Unsupported vector database provider: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for VectorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LanceDb => write!(f, "lancedb"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Providers read from TOML or the environment go through `FromStr`,
/// so `LanceDB` and `lancedb` are the same value.
fn parse_provider<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = MemoryError>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl<'de> Deserialize<'de> for GraphProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        parse_provider(deserializer)
    }
}

impl<'de> Deserialize<'de> for VectorProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        parse_provider(deserializer)
    }
}
