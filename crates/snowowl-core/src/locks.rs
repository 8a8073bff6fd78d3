//! Operation locks serializing commits per repository branch.

use crate::{Result, SnowowlError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Description used when no parent lock context is known.
pub const ROOT_LOCK_CONTEXT: &str = "ROOT";

/// Description of locks held while committing.
pub const COMMIT_LOCK_DESCRIPTION: &str = "commit";

/// What a lock protects: one branch of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DatastoreLockTarget {
    /// Repository id.
    pub repository_id: String,
    /// Branch path.
    pub branch_path: String,
}

impl DatastoreLockTarget {
    /// Creates a lock target.
    pub fn new(repository_id: impl Into<String>, branch_path: impl Into<String>) -> Self {
        Self {
            repository_id: repository_id.into(),
            branch_path: branch_path.into(),
        }
    }
}

impl fmt::Display for DatastoreLockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository_id, self.branch_path)
    }
}

/// Who holds a lock and why.
///
/// Re-entrancy is decided by `owner` alone; user and descriptions only show
/// up in conflict messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatastoreLockContext {
    /// Token of the operation holding the lock.
    pub owner: Uuid,
    /// Id of the user performing the operation.
    pub user_id: String,
    /// What the holder is doing, e.g. `commit`.
    pub description: String,
    /// Description of the enclosing operation.
    pub parent_description: String,
}

impl DatastoreLockContext {
    /// Creates a lock context with a fresh owner token.
    pub fn new(
        user_id: impl Into<String>,
        description: impl Into<String>,
        parent_description: impl Into<String>,
    ) -> Self {
        Self::owned_by(Uuid::new_v4(), user_id, description, parent_description)
    }

    /// Creates a lock context for an existing owner token.
    pub fn owned_by(
        owner: Uuid,
        user_id: impl Into<String>,
        description: impl Into<String>,
        parent_description: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            user_id: user_id.into(),
            description: description.into(),
            parent_description: parent_description.into(),
        }
    }
}

/// Exclusive, named locks with bounded acquisition time.
pub trait OperationLockManager: Send + Sync {
    /// Acquires `target` for `context`, waiting at most `timeout`.
    fn lock(
        &self,
        context: &DatastoreLockContext,
        timeout: Duration,
        target: &DatastoreLockTarget,
    ) -> Result<()>;

    /// Releases one acquisition of `target` held by `context`.
    fn unlock(&self, context: &DatastoreLockContext, target: &DatastoreLockTarget) -> Result<()>;

    /// Returns the current holder of `target`, if any.
    fn holder(&self, target: &DatastoreLockTarget) -> Option<DatastoreLockContext>;
}

struct HeldLock {
    context: DatastoreLockContext,
    count: usize,
}

/// In-process lock manager.
///
/// Locks are re-entrant for the same owner token and released when every
/// acquisition has been unlocked. Waiters are woken through a condition
/// variable whenever a lock is released.
#[derive(Default)]
pub struct DatastoreLockManager {
    held: Mutex<HashMap<DatastoreLockTarget, HeldLock>>,
    released: Condvar,
}

impl DatastoreLockManager {
    /// Creates a lock manager with no held locks.
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> Result<MutexGuard<'_, HashMap<DatastoreLockTarget, HeldLock>>> {
        self.held
            .lock()
            .map_err(|_| SnowowlError::Internal("lock manager state is poisoned".to_string()))
    }
}

impl OperationLockManager for DatastoreLockManager {
    fn lock(
        &self,
        context: &DatastoreLockContext,
        timeout: Duration,
        target: &DatastoreLockTarget,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held()?;
        loop {
            match held.get_mut(target) {
                None => {
                    held.insert(
                        target.clone(),
                        HeldLock {
                            context: context.clone(),
                            count: 1,
                        },
                    );
                    return Ok(());
                }
                Some(lock) if lock.context.owner == context.owner => {
                    lock.count += 1;
                    return Ok(());
                }
                Some(lock) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::warn!(
                            target = %target,
                            holder = %lock.context.user_id,
                            "Failed to acquire lock"
                        );
                        return Err(SnowowlError::Internal(format!(
                            "Failed to acquire lock for '{}' within {} ms, held by '{}' ({})",
                            target,
                            timeout.as_millis(),
                            lock.context.user_id,
                            lock.context.description
                        )));
                    }
                    let (guard, _) = self
                        .released
                        .wait_timeout(held, deadline - now)
                        .map_err(|_| {
                            SnowowlError::Internal("lock manager state is poisoned".to_string())
                        })?;
                    held = guard;
                }
            }
        }
    }

    fn unlock(&self, context: &DatastoreLockContext, target: &DatastoreLockTarget) -> Result<()> {
        let mut held = self.held()?;
        match held.get_mut(target) {
            Some(lock) if lock.context.owner == context.owner => {
                lock.count -= 1;
                if lock.count == 0 {
                    held.remove(target);
                    self.released.notify_all();
                }
                Ok(())
            }
            Some(lock) => Err(SnowowlError::IllegalState(format!(
                "Lock for '{}' is held by '{}', not '{}'",
                target, lock.context.user_id, context.user_id
            ))),
            None => Err(SnowowlError::IllegalState(format!(
                "Lock for '{}' is not held",
                target
            ))),
        }
    }

    fn holder(&self, target: &DatastoreLockTarget) -> Option<DatastoreLockContext> {
        self.held
            .lock()
            .ok()
            .and_then(|held| held.get(target).map(|lock| lock.context.clone()))
    }
}
