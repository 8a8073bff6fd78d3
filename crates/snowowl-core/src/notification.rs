//! Commit notifications.

use serde::Serialize;
use snowowl_index::{ChangeKind, Commit, ObjectId};
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Identifies one component touched by a commit.
pub type ComponentIdentifier = ObjectId;

/// Event published after a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryCommitNotification {
    /// Repository the commit was written to.
    pub repository_id: String,
    /// Commit id.
    pub commit_id: String,
    /// Commit group id.
    pub group_id: String,
    /// Branch path.
    pub branch: String,
    /// Commit timestamp.
    pub timestamp: i64,
    /// Commit author.
    pub author: String,
    /// Commit message.
    pub comment: String,
    /// Components created by the commit.
    pub new_components: BTreeSet<ComponentIdentifier>,
    /// Components with a new revision.
    pub changed_components: BTreeSet<ComponentIdentifier>,
    /// Components removed by the commit.
    pub deleted_components: BTreeSet<ComponentIdentifier>,
    /// Merge source branch, if the commit was a merge.
    pub merge_source: Option<String>,
}

impl RepositoryCommitNotification {
    /// Builds the notification of `commit`.
    pub fn from_commit(repository_id: &str, commit: &Commit) -> Self {
        Self {
            repository_id: repository_id.to_string(),
            commit_id: commit.id.clone(),
            group_id: commit.group_id.clone(),
            branch: commit.branch.clone(),
            timestamp: commit.timestamp,
            author: commit.author.clone(),
            comment: commit.comment.clone(),
            new_components: commit.components(ChangeKind::Added),
            changed_components: commit.components(ChangeKind::Changed),
            deleted_components: commit.components(ChangeKind::Removed),
            merge_source: commit.merge_source.clone(),
        }
    }
}

/// Receives commit notifications.
pub trait NotificationSink: Send + Sync {
    /// Publishes one notification.
    fn publish(&self, notification: RepositoryCommitNotification);
}

/// Keeps every published notification in memory.
#[derive(Debug, Default)]
pub struct BufferedNotificationSink {
    events: Mutex<Vec<RepositoryCommitNotification>>,
}

impl BufferedNotificationSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications published so far.
    pub fn events(&self) -> Vec<RepositoryCommitNotification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for BufferedNotificationSink {
    fn publish(&self, notification: RepositoryCommitNotification) {
        if let Ok(mut events) = self.events.lock() {
            events.push(notification);
        }
    }
}

/// Logs every notification at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn publish(&self, notification: RepositoryCommitNotification) {
        tracing::info!(
            repository = %notification.repository_id,
            branch = %notification.branch,
            commit = %notification.commit_id,
            timestamp = notification.timestamp,
            new = notification.new_components.len(),
            changed = notification.changed_components.len(),
            deleted = notification.deleted_components.len(),
            "{}",
            notification.comment
        );
    }
}
