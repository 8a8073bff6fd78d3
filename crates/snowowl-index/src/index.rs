//! In-memory, branch-aware revision index.
//!
//! Every write is kept as a revision stamped with its commit timestamp.
//! Reading a branch at timestamp `t` sees the latest revision at or before
//! `t` on that branch, falling back to the parent branch as of the child's
//! base timestamp. Removals are kept as tombstones so that they hide the
//! parent's revision.

use crate::branch::{child_path, RevisionBranch, MAIN};
use crate::{
    Commit, DocumentKind, IndexError, Mappings, ObjectId, PreCommitHook, Result, Revision,
    RevisionSearcher, StagingArea,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) struct StoredRevision<D> {
    pub timestamp: i64,
    pub doc: Option<D>,
}

pub(crate) struct BranchState<D> {
    pub info: RevisionBranch,
    pub revisions: HashMap<ObjectId, Vec<StoredRevision<D>>>,
}

impl<D: Revision> BranchState<D> {
    fn new(info: RevisionBranch) -> Self {
        Self {
            info,
            revisions: HashMap::new(),
        }
    }

    pub fn push(&mut self, key: ObjectId, timestamp: i64, doc: Option<D>) {
        self.revisions
            .entry(key)
            .or_default()
            .push(StoredRevision { timestamp, doc });
    }

    fn latest(&self, key: &ObjectId, at: i64) -> Option<&StoredRevision<D>> {
        self.revisions
            .get(key)
            .and_then(|revs| revs.iter().rev().find(|rev| rev.timestamp <= at))
    }
}

pub(crate) struct IndexState<D> {
    pub branches: HashMap<String, BranchState<D>>,
    pub commits: Vec<Commit>,
}

impl<D: Revision> IndexState<D> {
    pub fn branch(&self, path: &str) -> Result<&BranchState<D>> {
        self.branches
            .get(path)
            .ok_or_else(|| IndexError::BranchNotFound(path.to_string()))
    }

    /// Resolves one document on `path` as of `at`.
    pub fn resolve(&self, path: &str, key: &ObjectId, at: i64) -> Result<Option<D>> {
        let mut branch = self.branch(path)?;
        let mut at = at;
        loop {
            if let Some(rev) = branch.latest(key, at) {
                return Ok(rev.doc.clone());
            }
            match &branch.info.parent {
                Some(parent) => {
                    at = at.min(branch.info.base_timestamp);
                    branch = self.branch(parent)?;
                }
                None => return Ok(None),
            }
        }
    }

    /// Every live document of `kind` visible on `path` as of `at`, by id.
    pub fn visible(&self, path: &str, kind: DocumentKind, at: i64) -> Result<BTreeMap<String, D>> {
        let mut chain = Vec::new();
        let mut branch = self.branch(path)?;
        let mut at = at;
        loop {
            chain.push((branch, at));
            match &branch.info.parent {
                Some(parent) => {
                    at = at.min(branch.info.base_timestamp);
                    branch = self.branch(parent)?;
                }
                None => break,
            }
        }

        let mut docs = BTreeMap::new();
        for (branch, at) in chain.into_iter().rev() {
            for key in branch.revisions.keys().filter(|key| key.kind == kind) {
                match branch.latest(key, at) {
                    Some(StoredRevision { doc: Some(doc), .. }) => {
                        docs.insert(key.id.clone(), doc.clone());
                    }
                    Some(StoredRevision { doc: None, .. }) => {
                        docs.remove(&key.id);
                    }
                    None => {}
                }
            }
        }
        Ok(docs)
    }
}

struct IndexInner<D> {
    mappings: Mappings,
    state: RwLock<IndexState<D>>,
    hooks: RwLock<Vec<Arc<dyn PreCommitHook<D>>>>,
}

/// A branch-aware revision document store.
///
/// Cloning the index is cheap and yields a handle to the same store.
pub struct RevisionIndex<D> {
    inner: Arc<IndexInner<D>>,
}

impl<D> Clone for RevisionIndex<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Revision> RevisionIndex<D> {
    /// Creates an empty index with a single `MAIN` branch.
    pub fn new(mappings: Mappings) -> Self {
        let main = RevisionBranch {
            path: MAIN.to_string(),
            parent: None,
            base_timestamp: 0,
            head_timestamp: 0,
        };
        let mut branches = HashMap::new();
        branches.insert(MAIN.to_string(), BranchState::new(main));

        Self {
            inner: Arc::new(IndexInner {
                mappings,
                state: RwLock::new(IndexState {
                    branches,
                    commits: Vec::new(),
                }),
                hooks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Document kinds this index accepts.
    pub fn mappings(&self) -> &Mappings {
        &self.inner.mappings
    }

    /// Registers a hook run before every commit.
    pub fn register_hook(&self, hook: Arc<dyn PreCommitHook<D>>) -> Result<()> {
        self.inner
            .hooks
            .write()
            .map_err(|_| IndexError::Poisoned)?
            .push(hook);
        Ok(())
    }

    /// Creates `parent/name`, based on the parent's current head.
    pub fn create_branch(&self, parent: &str, name: &str) -> Result<RevisionBranch> {
        let path = child_path(parent, name)?;
        let mut state = self.state_mut()?;
        let base = state.branch(parent)?.info.head_timestamp;
        if state.branches.contains_key(&path) {
            return Err(IndexError::BranchExists(path));
        }

        let info = RevisionBranch {
            path: path.clone(),
            parent: Some(parent.to_string()),
            base_timestamp: base,
            head_timestamp: base,
        };
        state.branches.insert(path.clone(), BranchState::new(info.clone()));
        tracing::debug!(branch = %path, base, "Created branch");
        Ok(info)
    }

    /// Returns branch metadata.
    pub fn branch(&self, path: &str) -> Result<RevisionBranch> {
        Ok(self.state()?.branch(path)?.info.clone())
    }

    /// All branches ordered by path.
    pub fn branches(&self) -> Result<Vec<RevisionBranch>> {
        let state = self.state()?;
        let mut branches: Vec<_> = state.branches.values().map(|b| b.info.clone()).collect();
        branches.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(branches)
    }

    /// Opens a searcher pinned at the current head of `branch`.
    pub fn read(&self, branch: &str) -> Result<RevisionSearcher<D>> {
        let head = self.state()?.branch(branch)?.info.head_timestamp;
        Ok(RevisionSearcher::new(self.clone(), branch.to_string(), head))
    }

    /// Opens a searcher pinned at `timestamp` on `branch`.
    pub fn read_at(&self, branch: &str, timestamp: i64) -> Result<RevisionSearcher<D>> {
        self.state()?.branch(branch)?;
        Ok(RevisionSearcher::new(self.clone(), branch.to_string(), timestamp))
    }

    /// Opens an empty staging area targeting `branch`.
    pub fn prepare_commit(&self, branch: &str) -> Result<StagingArea<D>> {
        self.state()?.branch(branch)?;
        Ok(StagingArea::new(self.clone(), branch.to_string()))
    }

    /// Commits written to `branch`, oldest first.
    pub fn commits(&self, branch: &str) -> Result<Vec<Commit>> {
        let state = self.state()?;
        state.branch(branch)?;
        Ok(state
            .commits
            .iter()
            .filter(|commit| commit.branch == branch)
            .cloned()
            .collect())
    }

    pub(crate) fn hooks(&self) -> Result<Vec<Arc<dyn PreCommitHook<D>>>> {
        Ok(self
            .inner
            .hooks
            .read()
            .map_err(|_| IndexError::Poisoned)?
            .clone())
    }

    pub(crate) fn state(&self) -> Result<RwLockReadGuard<'_, IndexState<D>>> {
        self.inner.state.read().map_err(|_| IndexError::Poisoned)
    }

    pub(crate) fn state_mut(&self) -> Result<RwLockWriteGuard<'_, IndexState<D>>> {
        self.inner.state.write().map_err(|_| IndexError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_doc, make_index, NOTE};

    fn commit_docs(index: &RevisionIndex<crate::test_support::TestDoc>, branch: &str, ts: i64, ids: &[&str]) {
        let mut staging = index.prepare_commit(branch).unwrap();
        for id in ids {
            staging.stage_new(make_doc(NOTE, id, "v1")).unwrap();
        }
        staging.commit(None, None, ts, "test", "add").unwrap();
    }

    #[test]
    fn test_child_branch_sees_parent_state_at_base() {
        let index = make_index();
        commit_docs(&index, MAIN, 10, &["a"]);
        let child = index.create_branch(MAIN, "child").unwrap();
        assert_eq!(child.base_timestamp, 10);

        commit_docs(&index, MAIN, 20, &["b"]);

        let searcher = index.read("MAIN/child").unwrap();
        assert!(searcher.get(NOTE, "a").unwrap().is_some());
        assert!(searcher.get(NOTE, "b").unwrap().is_none());
        assert!(index.read(MAIN).unwrap().get(NOTE, "b").unwrap().is_some());
    }

    #[test]
    fn test_point_in_time_read() {
        let index = make_index();
        commit_docs(&index, MAIN, 10, &["a"]);
        commit_docs(&index, MAIN, 20, &["b"]);

        let searcher = index.read_at(MAIN, 15).unwrap();
        assert!(searcher.get(NOTE, "a").unwrap().is_some());
        assert!(searcher.get(NOTE, "b").unwrap().is_none());
    }

    #[test]
    fn test_tombstone_hides_parent_revision() {
        let index = make_index();
        commit_docs(&index, MAIN, 10, &["a"]);
        index.create_branch(MAIN, "child").unwrap();

        let doc = index.read("MAIN/child").unwrap().get(NOTE, "a").unwrap().unwrap();
        let mut staging = index.prepare_commit("MAIN/child").unwrap();
        staging.stage_remove(doc);
        staging.commit(None, None, 11, "test", "remove").unwrap();

        assert!(index.read("MAIN/child").unwrap().get(NOTE, "a").unwrap().is_none());
        assert!(index.read(MAIN).unwrap().get(NOTE, "a").unwrap().is_some());
    }

    #[test]
    fn test_branch_errors() {
        let index = make_index();
        index.create_branch(MAIN, "child").unwrap();
        assert_eq!(
            index.create_branch(MAIN, "child"),
            Err(IndexError::BranchExists("MAIN/child".to_string()))
        );
        assert!(matches!(index.read("MAIN/missing"), Err(IndexError::BranchNotFound(_))));
        assert_eq!(index.branches().unwrap().len(), 2);
    }

    #[test]
    fn test_commit_log_per_branch() {
        let index = make_index();
        commit_docs(&index, MAIN, 10, &["a"]);
        index.create_branch(MAIN, "child").unwrap();
        commit_docs(&index, "MAIN/child", 11, &["b"]);

        assert_eq!(index.commits(MAIN).unwrap().len(), 1);
        let child_commits = index.commits("MAIN/child").unwrap();
        assert_eq!(child_commits.len(), 1);
        assert_eq!(child_commits[0].timestamp, 11);
    }
}
