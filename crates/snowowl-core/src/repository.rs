//! Repositories and the registry holding them.

use crate::transaction::map_index_error;
use crate::{
    AllowAll, ComponentDeletionPolicy, DatastoreLockManager, MonotonicTimestampProvider,
    NotificationSink, OperationLockManager, RepositoryTransactionContext, Result, SnowowlError,
    TimestampProvider, TracingNotificationSink, TransactionConfig, TransactionServices,
};
use serde::Serialize;
use snowowl_index::{Mappings, Revision, RevisionBranch, RevisionIndex};
use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Health of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// Unusable.
    Red,
    /// Starting up or degraded.
    Yellow,
    /// Ready.
    Green,
}

/// One terminology repository: an index plus the services transactions use.
pub struct Repository<D> {
    id: String,
    index: RevisionIndex<D>,
    services: TransactionServices<D>,
    config: TransactionConfig,
    health: Mutex<HealthStatus>,
    health_changed: Condvar,
}

impl<D: Revision> Repository<D> {
    /// Creates a repository with in-process locks, monotonic timestamps, no
    /// deletion restrictions and notifications written to the log.
    pub fn new(id: impl Into<String>, mappings: Mappings) -> Self {
        Self {
            id: id.into(),
            index: RevisionIndex::new(mappings),
            services: TransactionServices {
                lock_manager: Arc::new(DatastoreLockManager::new()),
                timestamps: Arc::new(MonotonicTimestampProvider::new()),
                deletion_policy: Arc::new(AllowAll),
                notifications: Some(Arc::new(TracingNotificationSink)),
            },
            config: TransactionConfig::default(),
            health: Mutex::new(HealthStatus::Green),
            health_changed: Condvar::new(),
        }
    }

    /// Replaces the lock manager.
    pub fn with_lock_manager(mut self, lock_manager: Arc<dyn OperationLockManager>) -> Self {
        self.services.lock_manager = lock_manager;
        self
    }

    /// Replaces the timestamp provider.
    pub fn with_timestamps(mut self, timestamps: Arc<dyn TimestampProvider>) -> Self {
        self.services.timestamps = timestamps;
        self
    }

    /// Replaces the deletion policy.
    pub fn with_deletion_policy(mut self, policy: Arc<dyn ComponentDeletionPolicy<D>>) -> Self {
        self.services.deletion_policy = policy;
        self
    }

    /// Replaces the notification sink; `None` disables notifications.
    pub fn with_notifications(mut self, sink: Option<Arc<dyn NotificationSink>>) -> Self {
        self.services.notifications = sink;
        self
    }

    /// Replaces the transaction settings.
    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    /// Repository id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The underlying revision index.
    pub fn index(&self) -> &RevisionIndex<D> {
        &self.index
    }

    /// Looks up branch metadata.
    pub fn branch(&self, path: &str) -> Result<RevisionBranch> {
        self.index.branch(path).map_err(map_index_error)
    }

    /// Opens a transaction on `branch` acting for `user_id`.
    pub fn open_transaction(
        &self,
        branch: &str,
        user_id: &str,
    ) -> Result<RepositoryTransactionContext<D>> {
        RepositoryTransactionContext::new(
            self.id.clone(),
            self.index.clone(),
            branch,
            user_id,
            self.services.clone(),
            self.config.clone(),
        )
    }

    /// Current health.
    pub fn health(&self) -> HealthStatus {
        self.health
            .lock()
            .map(|health| *health)
            .unwrap_or(HealthStatus::Red)
    }

    /// Updates the health and wakes waiters.
    pub fn set_health(&self, status: HealthStatus) {
        if let Ok(mut health) = self.health.lock() {
            *health = status;
            self.health_changed.notify_all();
        }
    }

    /// Waits until the repository reports `expected`.
    pub fn wait_for_health(&self, expected: HealthStatus, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let poisoned = || SnowowlError::Internal("repository health is poisoned".to_string());
        let mut health = self.health.lock().map_err(|_| poisoned())?;
        while *health != expected {
            let now = Instant::now();
            if now >= deadline {
                return Err(SnowowlError::RequestTimeout(format!(
                    "Repository '{}' did not reach {:?} health within {} ms (current: {:?})",
                    self.id,
                    expected,
                    timeout.as_millis(),
                    *health
                )));
            }
            health = self
                .health_changed
                .wait_timeout(health, deadline - now)
                .map_err(|_| poisoned())?
                .0;
        }
        Ok(())
    }
}

/// Repositories by id.
pub struct RepositoryRegistry<D> {
    repositories: RwLock<BTreeMap<String, Arc<Repository<D>>>>,
}

impl<D> Default for RepositoryRegistry<D> {
    fn default() -> Self {
        Self {
            repositories: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<D: Revision> RepositoryRegistry<D> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a repository; ids must be unique.
    pub fn register(&self, repository: Repository<D>) -> Result<Arc<Repository<D>>> {
        let mut repositories = self
            .repositories
            .write()
            .map_err(|_| SnowowlError::Internal("repository registry is poisoned".to_string()))?;
        if repositories.contains_key(repository.id()) {
            return Err(SnowowlError::AlreadyExists {
                doc_type: "repository".to_string(),
                id: repository.id().to_string(),
            });
        }
        let repository = Arc::new(repository);
        repositories.insert(repository.id().to_string(), Arc::clone(&repository));
        Ok(repository)
    }

    /// Looks up a repository.
    pub fn get(&self, id: &str) -> Result<Arc<Repository<D>>> {
        self.repositories
            .read()
            .map_err(|_| SnowowlError::Internal("repository registry is poisoned".to_string()))?
            .get(id)
            .cloned()
            .ok_or_else(|| SnowowlError::ComponentNotFound {
                doc_type: "repository".to_string(),
                ids: vec![id.to_string()],
            })
    }

    /// Registered repository ids.
    pub fn ids(&self) -> Vec<String> {
        self.repositories
            .read()
            .map(|repositories| repositories.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes a repository, returning it if it was registered.
    pub fn remove(&self, id: &str) -> Option<Arc<Repository<D>>> {
        self.repositories
            .write()
            .ok()
            .and_then(|mut repositories| repositories.remove(id))
    }
}
