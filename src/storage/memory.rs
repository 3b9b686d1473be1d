//! In-process job request storage.
//!
//! Uses DashMap for concurrent access without a global lock.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{JobId, JobRequest, StorageBackend, StorageError};

/// Volatile backend; ids start at 1 and increase monotonically.
#[derive(Debug)]
pub struct InMemoryStorage {
    requests: DashMap<JobId, JobRequest>,
    next_id: AtomicU64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn store_job_request(&self, request: &JobRequest) -> Result<JobId, StorageError> {
        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.requests.insert(id, request.clone());
        Ok(id)
    }

    async fn get_job_request(&self, id: JobId) -> Result<JobRequest, StorageError> {
        self.requests
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StorageError::NotFound(id))
    }
}
