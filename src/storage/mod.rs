//! Job request persistence.
//!
//! A job request is stored once when a job is submitted and fetched again by
//! its [`JobId`]. The backend is pluggable; [`InMemoryStorage`] is provided
//! for single-process use and tests.

mod memory;

pub use memory::InMemoryStorage;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned to a stored job request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A job as submitted by a requestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_name: String,
    pub requestor: String,
    pub server_id: String,
    pub requested_at: DateTime<Utc>,
    /// Raw job descriptor (JSON).
    pub descriptor: String,
}

impl JobRequest {
    pub fn new(
        job_name: impl Into<String>,
        requestor: impl Into<String>,
        server_id: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            requestor: requestor.into(),
            server_id: server_id.into(),
            requested_at: Utc::now(),
            descriptor: descriptor.into(),
        }
    }
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("job request {0} not found")]
    NotFound(JobId),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced to job request emitters and fetchers.
#[derive(Debug, Error)]
pub enum JobRequestError {
    #[error("could not store job request: {0}")]
    Store(#[source] StorageError),
    #[error("could not fetch job request: {0}")]
    Fetch(#[source] StorageError),
}

/// Low-level persistence for job requests.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn store_job_request(&self, request: &JobRequest) -> Result<JobId, StorageError>;
    async fn get_job_request(&self, id: JobId) -> Result<JobRequest, StorageError>;
}

/// Persists new job requests.
#[async_trait]
pub trait JobRequestEmitter: Send + Sync {
    async fn emit(&self, request: &JobRequest) -> Result<JobId, JobRequestError>;
}

/// Retrieves job requests by id.
#[async_trait]
pub trait JobRequestFetcher: Send + Sync {
    async fn fetch(&self, id: JobId) -> Result<JobRequest, JobRequestError>;
}

/// Both halves of job request access.
pub trait JobRequestEmitterFetcher: JobRequestEmitter + JobRequestFetcher {}

impl<T: JobRequestEmitter + JobRequestFetcher> JobRequestEmitterFetcher for T {}

/// Emitter and fetcher over any [`StorageBackend`].
pub struct JobRequestStore<B> {
    backend: B,
}

impl<B: StorageBackend> JobRequestStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: StorageBackend> JobRequestEmitter for JobRequestStore<B> {
    async fn emit(&self, request: &JobRequest) -> Result<JobId, JobRequestError> {
        let id = self
            .backend
            .store_job_request(request)
            .await
            .map_err(JobRequestError::Store)?;
        tracing::debug!(job_id = %id, job_name = %request.job_name, "stored job request");
        Ok(id)
    }
}

#[async_trait]
impl<B: StorageBackend> JobRequestFetcher for JobRequestStore<B> {
    async fn fetch(&self, id: JobId) -> Result<JobRequest, JobRequestError> {
        self.backend
            .get_job_request(id)
            .await
            .map_err(JobRequestError::Fetch)
    }
}
