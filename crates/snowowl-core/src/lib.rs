//! # snowowl-core
//!
//! The repository layer of Snow Owl: transaction contexts with deferred
//! constraint checks, branch locks, commit timestamps, deletion policies,
//! commit notifications, repositories, code systems and attachments.

#![warn(missing_docs)]

mod attachments;
mod codesystem;
mod deletion;
mod error;
pub mod locks;
mod notification;
mod obligations;
mod repository;
mod timestamp;
mod transaction;

#[cfg(test)]
mod test_support;

pub use attachments::{AttachmentRegistry, FileAttachmentRegistry};
pub use codesystem::{CodeSystem, CodeSystemRegistry, CodeSystemSettings, CodeSystemVersion};
pub use deletion::{AllowAll, ComponentDeletionPolicy, CompositeDeletionPolicy};
pub use error::{Result, SnowowlError};
pub use locks::{DatastoreLockContext, DatastoreLockManager, DatastoreLockTarget, OperationLockManager};
pub use notification::{
    BufferedNotificationSink, ComponentIdentifier, NotificationSink, RepositoryCommitNotification,
    TracingNotificationSink,
};
pub use obligations::{ConstraintViolation, PendingObligations, ROOT_ID};
pub use repository::{HealthStatus, Repository, RepositoryRegistry};
pub use timestamp::{MonotonicTimestampProvider, TimestampProvider};
pub use transaction::{RepositoryTransactionContext, TransactionConfig, TransactionServices};
