//! Dataset orchestration: serve the cached dataset, else compute and persist it
//!
//! Per request the service runs CheckCache, ReadCache, Recompute, PersistCache,
//! Respond. A corrupt blob counts as a miss, a failed write is logged, and an
//! upstream failure degrades to the records fetched so far.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::{CacheError, CacheStore};
use crate::data::{project, Dataset, FetchError, UpstreamClient};

/// Upstream collection mirrored by default
pub const DEFAULT_ENDPOINT: &str = "character";

/// How upstream fetch failures reach the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Serve whatever was fetched and persist it
    #[default]
    BestEffort,
    /// Fail the request on any fetch error and persist nothing
    Strict,
}

/// Where a served dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    /// Read from the cache blob
    Cache,
    /// Computed from the upstream API during this request
    Upstream,
}

/// A dataset ready to be returned to the caller
#[derive(Debug, Clone)]
pub struct Served {
    pub dataset: Dataset,
    pub source: DatasetSource,
}

/// Errors surfaced to the caller (strict mode only)
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Upstream pagination stopped early
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),
}

/// Serves the character dataset, computing it on a cache miss
#[derive(Debug)]
pub struct DatasetService {
    client: UpstreamClient,
    store: Arc<dyn CacheStore>,
    endpoint: String,
    policy: FailurePolicy,
}

impl DatasetService {
    /// Creates a best-effort service for the default endpoint
    pub fn new(client: UpstreamClient, store: Arc<dyn CacheStore>) -> Self {
        Self {
            client,
            store,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            policy: FailurePolicy::default(),
        }
    }

    /// Mirrors a different upstream collection
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the failure policy
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Returns the cached dataset, or computes, persists and returns a fresh one
    ///
    /// # Returns
    /// * `Ok(Served)` - always under `BestEffort`, possibly with partial data
    /// * `Err(ServiceError)` - only under `Strict` when the upstream walk failed
    pub async fn dataset(&self) -> Result<Served, ServiceError> {
        match self.read_cache().await {
            Ok(Some(dataset)) => {
                info!(records = dataset.len(), "Data already exists. Reading from cache");
                return Ok(Served {
                    dataset,
                    source: DatasetSource::Cache,
                });
            }
            Ok(None) => info!("Data not found. Collecting new data"),
            Err(e) => warn!(error = %e, "Cache unreadable, recomputing"),
        }

        let (dataset, fetch_error) = self.compute().await;

        if let Some(e) = fetch_error {
            if self.policy == FailurePolicy::Strict {
                return Err(ServiceError::Upstream(e));
            }
            warn!(records = dataset.len(), error = %e, "Serving partial dataset");
        }

        self.persist(&dataset).await;

        Ok(Served {
            dataset,
            source: DatasetSource::Upstream,
        })
    }

    /// Walks the upstream collection and projects every record
    async fn compute(&self) -> (Dataset, Option<FetchError>) {
        let outcome = self.client.fetch_all(&self.endpoint).await;
        let dataset: Dataset = outcome.records.iter().filter_map(project).collect();
        info!(
            fetched = outcome.records.len(),
            kept = dataset.len(),
            endpoint = %self.endpoint,
            "Filtered upstream records"
        );
        (dataset, outcome.error)
    }

    async fn read_cache(&self) -> Result<Option<Dataset>, CacheError> {
        self.blocking(|store| {
            if store.exists() {
                store.read().map(Some)
            } else {
                Ok(None)
            }
        })
        .await
    }

    /// Best-effort write; failures are logged and never reach the caller
    async fn persist(&self, dataset: &Dataset) {
        let count = dataset.len();
        let snapshot = dataset.clone();
        match self.blocking(move |store| store.write(&snapshot)).await {
            Ok(()) => info!(records = count, "Saved dataset to cache"),
            Err(e) => error!(error = %e, "Failed to persist dataset"),
        }
    }

    /// Runs a store operation on the blocking pool
    async fn blocking<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CacheStore) -> Result<T, CacheError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .unwrap_or_else(|join_error| Err(CacheError::Task(join_error)))
    }
}
