//! Commits and per-type change details.

use crate::{DocumentKind, ObjectId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How a document was affected by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The document was created.
    Added,
    /// A new revision of the document was written.
    Changed,
    /// The document was removed.
    Removed,
}

/// Changed component ids of one component type, grouped by container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitDetail {
    /// How the components were affected.
    pub change: ChangeKind,
    /// Kind of the containing objects.
    pub container_type: DocumentKind,
    /// Kind of the affected components.
    pub component_type: DocumentKind,
    /// Container id to affected component ids.
    pub components: BTreeMap<String, BTreeSet<String>>,
}

impl CommitDetail {
    /// Affected components as object ids.
    pub fn component_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.components
            .values()
            .flatten()
            .map(|id| ObjectId::new(self.component_type, id.clone()))
    }

    /// Affected containers as object ids.
    pub fn container_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.components
            .keys()
            .map(|id| ObjectId::new(self.container_type, id.clone()))
    }
}

/// Result of one successful staging area commit. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    /// Unique commit id.
    pub id: String,
    /// Group id; commits of one logical operation share it.
    pub group_id: String,
    /// Branch the commit was written to.
    pub branch: String,
    /// Commit timestamp, also the revision timestamp of every document.
    pub timestamp: i64,
    /// Author of the commit.
    pub author: String,
    /// Commit message.
    pub comment: String,
    /// Branch merged into `branch` by this commit, if any.
    pub merge_source: Option<String>,
    /// Per-type change details.
    pub details: Vec<CommitDetail>,
}

impl Commit {
    /// Ids of components affected by the given change.
    pub fn components(&self, change: ChangeKind) -> BTreeSet<ObjectId> {
        self.details
            .iter()
            .filter(|detail| detail.change == change)
            .flat_map(CommitDetail::component_ids)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_detail(change: ChangeKind, container: &str, ids: &[&str]) -> CommitDetail {
        let mut components = BTreeMap::new();
        components.insert(
            container.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        CommitDetail {
            change,
            container_type: DocumentKind("concept"),
            component_type: DocumentKind("description"),
            components,
        }
    }

    #[test]
    fn test_components_by_change() {
        let commit = Commit {
            id: "c1".to_string(),
            group_id: "c1".to_string(),
            branch: "MAIN".to_string(),
            timestamp: 10,
            author: "test".to_string(),
            comment: "test".to_string(),
            merge_source: None,
            details: vec![
                make_detail(ChangeKind::Added, "100005", &["1001", "1002"]),
                make_detail(ChangeKind::Removed, "100005", &["1003"]),
            ],
        };

        let added = commit.components(ChangeKind::Added);
        assert_eq!(added.len(), 2);
        assert!(added.contains(&ObjectId::new(DocumentKind("description"), "1001")));
        assert_eq!(commit.components(ChangeKind::Changed).len(), 0);
        assert_eq!(
            commit.details[1].container_ids().collect::<Vec<_>>(),
            vec![ObjectId::new(DocumentKind("concept"), "100005")]
        );
    }
}
