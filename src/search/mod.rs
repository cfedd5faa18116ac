// file: src/search/mod.rs
// description: search module exports and the search entry point
// reference: internal module structure

pub mod history;
pub mod retrievers;
pub mod types;

pub use history::{get_history, log_query, log_result};
pub use retrievers::{CollectionRetriever, InsightsRetriever, Retriever};
pub use types::{SearchRequest, SearchType};

use crate::config::SearchConfig;
use crate::database::{GraphEngine, MetadataStore, VectorEngine};
use crate::error::Result;
use crate::models::{SearchResult, User};
use crate::retrieval::{GraphCompletionOptions, GraphCompletionRetriever};
use crate::utils::telemetry::OperationTimer;
use crate::utils::validation::Validator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

const SLOW_SEARCH: Duration = Duration::from_secs(2);

pub struct SearchService {
    config: SearchConfig,
    graph: Arc<dyn GraphEngine>,
    vector: Arc<dyn VectorEngine>,
    metadata: Arc<Mutex<MetadataStore>>,
}

impl SearchService {
    pub fn new(
        config: SearchConfig,
        graph: Arc<dyn GraphEngine>,
        vector: Arc<dyn VectorEngine>,
        metadata: Arc<Mutex<MetadataStore>>,
    ) -> Self {
        Self {
            config,
            graph,
            vector,
            metadata,
        }
    }

    /// Runs one search on behalf of `user`, logging the query before and the results after.
    /// Invalid requests fail before anything is logged.
    pub async fn search(&self, request: &SearchRequest, user: &User) -> Result<Vec<SearchResult>> {
        Validator::validate_query(&request.query_text)?;
        let top_k = request.top_k.unwrap_or(self.config.top_k);
        Validator::validate_top_k(top_k)?;

        let retriever = self.retriever(request, top_k);
        self.run_logged(retriever.as_ref(), request, user, top_k).await
    }

    /// A failed retrieval still gets an empty Result entry so history stays paired.
    async fn run_logged(
        &self,
        retriever: &dyn Retriever,
        request: &SearchRequest,
        user: &User,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let timer = OperationTimer::new(&format!("search {}", request.query_type));

        {
            let mut store = self.metadata.lock().await;
            log_query(&mut store, user.id, request.query_type, &request.query_text).await?;
        }

        let outcome = retriever.get_results(&request.query_text, top_k).await;
        {
            let logged = outcome.as_deref().unwrap_or_default();
            let mut store = self.metadata.lock().await;
            log_result(&mut store, user.id, request.query_type, logged).await?;
        }
        let results = outcome?;

        timer.warn_if_slow(SLOW_SEARCH, "search");
        timer.finish_with_count(results.len());
        info!(
            "{} search returned {} result(s)",
            request.query_type,
            results.len()
        );

        Ok(results)
    }

    fn retriever(&self, request: &SearchRequest, top_k: usize) -> Box<dyn Retriever> {
        match request.query_type {
            SearchType::Insights => Box::new(InsightsRetriever::new(
                self.graph.clone(),
                self.vector.clone(),
            )),
            SearchType::Chunks => Box::new(CollectionRetriever::chunks(self.vector.clone())),
            SearchType::Summaries => Box::new(CollectionRetriever::summaries(self.vector.clone())),
            SearchType::GraphCompletion => Box::new(GraphCompletionRetriever::new(
                self.graph.clone(),
                self.vector.clone(),
                GraphCompletionOptions {
                    top_k,
                    triplet_candidates: self.config.triplet_candidates,
                    node_type: request.node_type,
                    node_names: request.node_names.clone(),
                },
            )),
        }
    }
}
