// file: src/database/embeddings.rs
// description: text embeddings via the Groq API with a deterministic hashed fallback
// reference: https://console.groq.com/docs/embeddings

use crate::config::VectorConfig;
use crate::error::{MemoryError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, warn};

const GROQ_EMBEDDINGS_URL: &str = "https://api.groq.com/openai/v1/embeddings";

lazy_static! {
    static ref EMBED_TOKEN: Regex =
        Regex::new(r"[\p{L}\p{N}]+").expect("EMBED_TOKEN regex is valid");
}

#[derive(Debug, Serialize)]
struct GroqEmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GroqEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct GroqEmbeddingClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GroqEmbeddingClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let request = GroqEmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
        };

        debug!(
            "Requesting embedding from Groq API for {} chars",
            text.len()
        );

        let response = self
            .client
            .post(GROQ_EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                MemoryError::Embedding(format!("Failed to send Groq API request: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MemoryError::Embedding(format!(
                "Groq API request failed with status {}: {}",
                status, error_text
            )));
        }

        let embedding_response: GroqEmbeddingResponse = response.json().await.map_err(|e| {
            MemoryError::Embedding(format!("Failed to parse Groq API response: {}", e))
        })?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| {
                MemoryError::Embedding("No embedding data returned from Groq API".to_string())
            })
    }
}

const SOURCE_UNDECIDED: u8 = 0;
const SOURCE_REMOTE: u8 = 1;
const SOURCE_HASHED: u8 = 2;

/// Produces fixed-size vectors for the vector engines.
///
/// The first remote call decides the embedding kind for the embedder's
/// lifetime: a failure switches to hashed vectors for good, while a failure
/// after a remote success is an error, so one collection never holds both.
pub struct Embedder {
    remote: Option<GroqEmbeddingClient>,
    dimensions: usize,
    source: AtomicU8,
}

impl Embedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            remote: None,
            dimensions,
            source: AtomicU8::new(SOURCE_HASHED),
        }
    }

    pub fn from_config(config: &VectorConfig) -> Self {
        let remote = config
            .groq_api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| GroqEmbeddingClient::new(key.clone(), config.groq_model.clone()));

        if remote.is_some() {
            debug!("Embedder initialized with Groq API embeddings");
        } else {
            debug!("Embedder initialized without API key - using hashed embeddings");
        }

        let source = if remote.is_some() {
            SOURCE_UNDECIDED
        } else {
            SOURCE_HASHED
        };

        Self {
            remote,
            dimensions: config.embedding_dimensions,
            source: AtomicU8::new(source),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn uses_hashed_embeddings(&self) -> bool {
        self.source.load(Ordering::Acquire) == SOURCE_HASHED
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self.remote {
            Some(ref client) if !self.uses_hashed_embeddings() => {
                let outcome = client.generate_embedding(text).await;
                self.settle(text, outcome)
            }
            _ => Ok(Self::hashed_embedding(text, self.dimensions)),
        }
    }

    fn settle(&self, text: &str, outcome: Result<Vec<f32>>) -> Result<Vec<f32>> {
        let failure = match outcome {
            Ok(embedding) if embedding.len() == self.dimensions => {
                let decided = self.source.compare_exchange(
                    SOURCE_UNDECIDED,
                    SOURCE_REMOTE,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                // a concurrent failure may already have switched to hashed
                return Ok(match decided {
                    Err(SOURCE_HASHED) => Self::hashed_embedding(text, self.dimensions),
                    _ => embedding,
                });
            }
            Ok(embedding) => format!(
                "Groq API returned embedding with dimension {}, expected {}",
                embedding.len(),
                self.dimensions
            ),
            Err(e) => format!("Groq API embedding failed: {}", e),
        };

        let latched = self.source.compare_exchange(
            SOURCE_UNDECIDED,
            SOURCE_HASHED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        match latched {
            Ok(_) | Err(SOURCE_HASHED) => {
                warn!("{}. Using hashed embeddings from now on.", failure);
                Ok(Self::hashed_embedding(text, self.dimensions))
            }
            Err(_) => Err(MemoryError::Embedding(failure)),
        }
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Deterministic bag-of-words embedding: every lowercased token is hashed into
    /// one signed bucket, the result is L2 normalised. Empty text yields a zero vector.
    pub fn hashed_embedding(text: &str, dim: usize) -> Vec<f32> {
        let mut vector = vec![0.0f32; dim];
        if dim == 0 {
            return vector;
        }

        for token in EMBED_TOKEN.find_iter(text) {
            let digest = Sha256::digest(token.as_str().to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let hash = u64::from_le_bytes(bucket);
            let idx = (hash % dim as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
