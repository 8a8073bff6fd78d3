//! Staged changes of one transaction.

use crate::commit::{ChangeKind, Commit, CommitDetail};
use crate::{DocumentKind, IndexError, ObjectId, Result, Revision, RevisionIndex};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

type DetailKey = (ChangeKind, DocumentKind, DocumentKind);

/// Mutable buffer of new, changed and removed documents for one branch.
///
/// Nothing staged here is visible to readers until [`StagingArea::commit`]
/// succeeds. A successful commit resets the staging area so it can be used
/// for the next commit on the same branch.
pub struct StagingArea<D> {
    index: RevisionIndex<D>,
    branch: String,
    new_objects: BTreeMap<ObjectId, D>,
    changed_objects: BTreeMap<ObjectId, (D, D)>,
    removed_objects: BTreeMap<ObjectId, D>,
}

impl<D: Revision> StagingArea<D> {
    pub(crate) fn new(index: RevisionIndex<D>, branch: String) -> Self {
        Self {
            index,
            branch,
            new_objects: BTreeMap::new(),
            changed_objects: BTreeMap::new(),
            removed_objects: BTreeMap::new(),
        }
    }

    /// Branch the staged changes will be committed to.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Stages a new document.
    ///
    /// Re-adding a document removed in the same staging area turns the pair
    /// into a change.
    pub fn stage_new(&mut self, doc: D) -> Result<()> {
        self.check_mapped(doc.kind())?;
        let key = doc.object_id();
        if let Some(old) = self.removed_objects.remove(&key) {
            self.changed_objects.insert(key, (old, doc));
        } else {
            self.new_objects.insert(key, doc);
        }
        Ok(())
    }

    /// Stages a new revision of an existing document.
    ///
    /// Changing a document removed in the same staging area cancels the
    /// removal.
    pub fn stage_change(&mut self, old: D, new: D) -> Result<()> {
        self.check_mapped(new.kind())?;
        let key = new.object_id();
        if let Some(removed) = self.removed_objects.remove(&key) {
            self.changed_objects.insert(key, (removed, new));
        } else if let Some(staged) = self.new_objects.get_mut(&key) {
            *staged = new;
        } else if let Some((_, staged)) = self.changed_objects.get_mut(&key) {
            *staged = new;
        } else {
            self.changed_objects.insert(key, (old, new));
        }
        Ok(())
    }

    /// Stages the removal of a document.
    ///
    /// Removing a document staged as new simply drops it.
    pub fn stage_remove(&mut self, doc: D) {
        let key = doc.object_id();
        if self.new_objects.remove(&key).is_some() {
            return;
        }
        let old = match self.changed_objects.remove(&key) {
            Some((old, _)) => old,
            None => doc,
        };
        self.removed_objects.insert(key, old);
    }

    /// Returns true if `key` is staged as new.
    pub fn is_new(&self, key: &ObjectId) -> bool {
        self.new_objects.contains_key(key)
    }

    /// Returns true if `key` is staged as changed.
    pub fn is_changed(&self, key: &ObjectId) -> bool {
        self.changed_objects.contains_key(key)
    }

    /// Returns true if `key` is staged for removal.
    pub fn is_removed(&self, key: &ObjectId) -> bool {
        self.removed_objects.contains_key(key)
    }

    /// Staged document for `key`, new or the new side of a change.
    pub fn staged(&self, key: &ObjectId) -> Option<&D> {
        self.new_objects
            .get(key)
            .or_else(|| self.changed_objects.get(key).map(|(_, new)| new))
    }

    /// Documents staged as new.
    pub fn new_objects(&self) -> impl Iterator<Item = &D> {
        self.new_objects.values()
    }

    /// Staged changes as (old, new) pairs.
    pub fn changed_objects(&self) -> impl Iterator<Item = (&D, &D)> {
        self.changed_objects.values().map(|(old, new)| (old, new))
    }

    /// Documents staged for removal.
    pub fn removed_objects(&self) -> impl Iterator<Item = &D> {
        self.removed_objects.values()
    }

    /// Returns true if anything is staged.
    pub fn is_dirty(&self) -> bool {
        !(self.new_objects.is_empty()
            && self.changed_objects.is_empty()
            && self.removed_objects.is_empty())
    }

    /// Drops every staged change.
    pub fn reset(&mut self) {
        self.new_objects.clear();
        self.changed_objects.clear();
        self.removed_objects.clear();
    }

    /// Writes every staged change to the branch under `timestamp`.
    ///
    /// Pre-commit hooks run first; their errors abort the commit before
    /// anything is written. Removals, additions and changes are then applied
    /// under the index write lock, so readers observe all of them or none.
    /// The staging area is reset on success and left untouched on failure.
    pub fn commit(
        &mut self,
        group_id: Option<&str>,
        merge_source: Option<&str>,
        timestamp: i64,
        author: &str,
        comment: &str,
    ) -> Result<Commit> {
        for hook in self.index.hooks()? {
            let searcher = self.index.read(&self.branch)?;
            hook.before_commit(self, &searcher)?;
        }

        let details = self.details();
        let commit = {
            let mut state = self.index.state_mut()?;
            let branch = state
                .branches
                .get_mut(&self.branch)
                .ok_or_else(|| IndexError::BranchNotFound(self.branch.clone()))?;
            if timestamp <= branch.info.head_timestamp {
                return Err(IndexError::StaleTimestamp {
                    branch: self.branch.clone(),
                    timestamp,
                    head: branch.info.head_timestamp,
                });
            }

            for key in self.removed_objects.keys() {
                branch.push(key.clone(), timestamp, None);
            }
            for (key, doc) in &self.new_objects {
                branch.push(key.clone(), timestamp, Some(doc.clone()));
            }
            for (key, (_, doc)) in &self.changed_objects {
                branch.push(key.clone(), timestamp, Some(doc.clone()));
            }
            branch.info.head_timestamp = timestamp;

            let id = Uuid::new_v4().to_string();
            let commit = Commit {
                group_id: group_id.map_or_else(|| id.clone(), str::to_string),
                id,
                branch: self.branch.clone(),
                timestamp,
                author: author.to_string(),
                comment: comment.to_string(),
                merge_source: merge_source.map(str::to_string),
                details,
            };
            state.commits.push(commit.clone());
            commit
        };

        tracing::debug!(
            branch = %self.branch,
            timestamp,
            new = self.new_objects.len(),
            changed = self.changed_objects.len(),
            removed = self.removed_objects.len(),
            "Committed staging area"
        );
        self.reset();
        Ok(commit)
    }

    fn check_mapped(&self, kind: DocumentKind) -> Result<()> {
        if self.index.mappings().contains(kind) {
            Ok(())
        } else {
            Err(IndexError::UnmappedKind(kind.name().to_string()))
        }
    }

    fn details(&self) -> Vec<CommitDetail> {
        let mut grouped: BTreeMap<DetailKey, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
        let mut record = |change: ChangeKind, doc: &D| {
            let container = doc.container();
            grouped
                .entry((change, container.kind, doc.kind()))
                .or_default()
                .entry(container.id)
                .or_default()
                .insert(doc.id().to_string());
        };

        for doc in self.new_objects.values() {
            record(ChangeKind::Added, doc);
        }
        for (_, doc) in self.changed_objects.values() {
            record(ChangeKind::Changed, doc);
        }
        for doc in self.removed_objects.values() {
            record(ChangeKind::Removed, doc);
        }

        grouped
            .into_iter()
            .map(|((change, container_type, component_type), components)| CommitDetail {
                change,
                container_type,
                component_type,
                components,
            })
            .collect()
    }
}
