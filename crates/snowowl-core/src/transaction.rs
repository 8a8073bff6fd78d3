//! The repository transaction context.
//!
//! A [`RepositoryTransactionContext`] is the unit of work against one branch
//! of one repository. It stages new, changed and removed documents, collects
//! uniqueness and presence obligations, and writes everything in one atomic
//! commit guarded by the branch lock.

use crate::locks::{COMMIT_LOCK_DESCRIPTION, ROOT_LOCK_CONTEXT};
use crate::{
    ComponentDeletionPolicy, ConstraintViolation, DatastoreLockContext, DatastoreLockTarget,
    NotificationSink, OperationLockManager, PendingObligations, RepositoryCommitNotification,
    Result, SnowowlError, TimestampProvider,
};
use snowowl_index::{
    Commit, DocumentKind, IndexError, ObjectId, Revision, RevisionIndex, RevisionSearcher,
    StagingArea,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Page size used when clearing repository contents.
const CLEAR_PAGE_SIZE: usize = 10_000;

/// Transaction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    /// How long `commit` waits for the branch lock.
    pub lock_timeout: Duration,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(1000),
        }
    }
}

/// Collaborators a transaction context needs besides the index.
pub struct TransactionServices<D> {
    /// Branch lock manager.
    pub lock_manager: Arc<dyn OperationLockManager>,
    /// Commit timestamp source.
    pub timestamps: Arc<dyn TimestampProvider>,
    /// Policy consulted by non-forced deletes.
    pub deletion_policy: Arc<dyn ComponentDeletionPolicy<D>>,
    /// Receives commit notifications; `None` disables them.
    pub notifications: Option<Arc<dyn NotificationSink>>,
}

impl<D> Clone for TransactionServices<D> {
    fn clone(&self) -> Self {
        Self {
            lock_manager: Arc::clone(&self.lock_manager),
            timestamps: Arc::clone(&self.timestamps),
            deletion_policy: Arc::clone(&self.deletion_policy),
            notifications: self.notifications.clone(),
        }
    }
}

/// Unit of work against one repository branch.
///
/// The context stays open after a successful or failed commit and may be
/// committed again; [`rollback`](Self::rollback) closes it for good.
pub struct RepositoryTransactionContext<D: Revision> {
    repository_id: String,
    user_id: String,
    parent_lock_description: Option<String>,
    // identifies this context as lock holder; the user id does not
    lock_owner: Uuid,
    index: RevisionIndex<D>,
    staging: StagingArea<D>,
    services: TransactionServices<D>,
    config: TransactionConfig,
    resolved: HashMap<ObjectId, D>,
    obligations: PendingObligations,
    closed: bool,
}

impl<D: Revision> RepositoryTransactionContext<D> {
    /// Opens a transaction on `branch`.
    pub fn new(
        repository_id: impl Into<String>,
        index: RevisionIndex<D>,
        branch: &str,
        user_id: impl Into<String>,
        services: TransactionServices<D>,
        config: TransactionConfig,
    ) -> Result<Self> {
        let staging = index.prepare_commit(branch).map_err(map_index_error)?;
        Ok(Self {
            repository_id: repository_id.into(),
            user_id: user_id.into(),
            parent_lock_description: None,
            lock_owner: Uuid::new_v4(),
            index,
            staging,
            services,
            config,
            resolved: HashMap::new(),
            obligations: PendingObligations::default(),
            closed: false,
        })
    }

    /// Sets the lock description used as parent when `commit` gets none.
    pub fn with_parent_lock(mut self, description: impl Into<String>) -> Self {
        self.parent_lock_description = Some(description.into());
        self
    }

    /// Repository id.
    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    /// Branch path this transaction writes to.
    pub fn branch(&self) -> &str {
        self.staging.branch()
    }

    /// User the transaction acts for.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns true if anything is staged.
    pub fn is_dirty(&self) -> bool {
        self.staging.is_dirty()
    }

    /// Returns true once the transaction was rolled back.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The staged changes.
    pub fn staging(&self) -> &StagingArea<D> {
        &self.staging
    }

    /// Opens a searcher at the current head of the branch.
    pub fn searcher(&self) -> Result<RevisionSearcher<D>> {
        self.index.read(self.branch()).map_err(map_index_error)
    }

    /// Stages a new document.
    pub fn add(&mut self, doc: D) -> Result<()> {
        self.ensure_open()?;
        if !self.index.mappings().contains(doc.kind()) {
            return Err(SnowowlError::UnsupportedOperation(format!(
                "Document type '{}' is not a revision document of repository '{}'",
                doc.kind(),
                self.repository_id
            )));
        }
        let key = doc.object_id();
        self.staging.stage_new(doc.clone()).map_err(map_index_error)?;
        self.resolved.insert(key, doc);
        Ok(())
    }

    /// Stages a new revision of `old`.
    ///
    /// If `old` was added in this transaction and not committed yet, the
    /// staged new document is replaced instead of recording a change.
    pub fn update(&mut self, old: D, new: D) -> Result<()> {
        self.ensure_open()?;
        let key = new.object_id();
        let staged = if self.staging.is_new(&key) {
            self.staging.stage_new(new.clone())
        } else {
            self.staging.stage_change(old, new.clone())
        };
        staged.map_err(map_index_error)?;
        self.resolved.insert(key, new);
        Ok(())
    }

    /// Stages the removal of `doc`.
    ///
    /// Unless `force` is set, the deletion policy must allow it.
    pub fn delete(&mut self, doc: D, force: bool) -> Result<()> {
        self.ensure_open()?;
        if !force && !self.services.deletion_policy.can_delete(&doc) {
            return Err(SnowowlError::Conflict(format!(
                "{} '{}' cannot be deleted",
                doc.kind(),
                doc.id()
            )));
        }
        self.resolved.remove(&doc.object_id());
        self.staging.stage_remove(doc);
        Ok(())
    }

    /// Resolves every id in `ids`, failing if any of them is missing.
    pub fn lookup<S: AsRef<str>>(&mut self, kind: DocumentKind, ids: &[S]) -> Result<Vec<D>> {
        let docs = self.lookup_if_exists(kind, ids)?;
        if docs.len() < ids.len() {
            let missing: Vec<String> = ids
                .iter()
                .map(|id| id.as_ref())
                .filter(|id| !docs.iter().any(|doc| doc.id() == *id))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                return Err(SnowowlError::ComponentNotFound {
                    doc_type: kind.to_string(),
                    ids: missing,
                });
            }
        }
        Ok(docs)
    }

    /// Resolves one document, failing if it is missing.
    pub fn lookup_one(&mut self, kind: DocumentKind, id: &str) -> Result<D> {
        let mut docs = self.lookup(kind, &[id])?;
        docs.pop().ok_or_else(|| SnowowlError::ComponentNotFound {
            doc_type: kind.to_string(),
            ids: vec![id.to_string()],
        })
    }

    /// Resolves the ids in `ids` that exist.
    ///
    /// Documents staged in this transaction are returned in their staged
    /// state; ids staged for removal are not returned. Everything else is
    /// read from the branch head and cached.
    pub fn lookup_if_exists<S: AsRef<str>>(
        &mut self,
        kind: DocumentKind,
        ids: &[S],
    ) -> Result<Vec<D>> {
        let mut unresolved = Vec::new();
        for id in ids {
            let key = ObjectId::new(kind, id.as_ref());
            if !self.resolved.contains_key(&key) && !self.staging.is_removed(&key) {
                unresolved.push(id.as_ref().to_string());
            }
        }

        if !unresolved.is_empty() {
            let fetched = self
                .searcher()?
                .get_all(kind, unresolved.as_slice())
                .map_err(map_index_error)?;
            for doc in fetched {
                self.resolved.insert(doc.object_id(), doc);
            }
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.resolved.get(&ObjectId::new(kind, id.as_ref())).cloned())
            .collect())
    }

    /// Requires that none of `ids` exist when the transaction commits.
    pub fn ensure_unique<I, S>(&mut self, kind: DocumentKind, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.obligations.ensure_unique(kind, ids);
    }

    /// Requires that all of `ids` exist or are staged when the transaction commits.
    pub fn ensure_present<I, S>(&mut self, kind: DocumentKind, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.obligations.ensure_present(kind, ids);
    }

    /// Checks the pending obligations without committing.
    pub fn validate(&self) -> std::result::Result<(), Vec<ConstraintViolation>> {
        let searcher = match self.searcher() {
            Ok(searcher) => searcher,
            Err(err) => return Err(vec![ConstraintViolation::CheckFailed(err.to_string())]),
        };
        match self.obligations.check(&self.staging, &searcher) {
            Ok(violations) if violations.is_empty() => Ok(()),
            Ok(violations) => Err(violations),
            Err(err) => Err(vec![ConstraintViolation::CheckFailed(err.to_string())]),
        }
    }

    /// Commits every staged change.
    ///
    /// Returns `Ok(None)` without taking the lock if nothing is staged. The
    /// lock is released and local caches and obligations are cleared whether
    /// or not the commit succeeds; a failed commit, including one that timed
    /// out waiting for the lock, also discards the staged changes. Notifications are published after the lock is released.
    pub fn commit(
        &mut self,
        author: &str,
        comment: &str,
        parent_lock: Option<&str>,
    ) -> Result<Option<Commit>> {
        self.ensure_open()?;
        if !self.staging.is_dirty() {
            return Ok(None);
        }

        let parent = parent_lock
            .map(str::to_string)
            .or_else(|| self.parent_lock_description.clone())
            .unwrap_or_else(|| ROOT_LOCK_CONTEXT.to_string());
        let context = DatastoreLockContext::owned_by(
            self.lock_owner,
            &self.user_id,
            COMMIT_LOCK_DESCRIPTION,
            parent,
        );
        let target = DatastoreLockTarget::new(&self.repository_id, self.branch());

        let result = self
            .services
            .lock_manager
            .lock(&context, self.config.lock_timeout, &target)
            .and_then(|()| {
                let result = self.commit_locked(author, comment);
                if let Err(err) = self.services.lock_manager.unlock(&context, &target) {
                    tracing::warn!(target = %target, "Failed to release commit lock: {}", err);
                }
                result
            });
        self.resolved.clear();
        self.obligations.clear();

        match result {
            Ok(commit) => {
                if let Some(sink) = &self.services.notifications {
                    sink.publish(RepositoryCommitNotification::from_commit(
                        &self.repository_id,
                        &commit,
                    ));
                }
                Ok(Some(commit))
            }
            Err(err) => {
                self.staging.reset();
                Err(err)
            }
        }
    }

    fn commit_locked(&mut self, author: &str, comment: &str) -> Result<Commit> {
        if let Err(violations) = self.validate() {
            tracing::warn!(
                branch = %self.branch(),
                violations = violations.len(),
                "Commit rejected by constraint check"
            );
            return Err(violations
                .into_iter()
                .next()
                .map(SnowowlError::from)
                .unwrap_or_else(|| SnowowlError::Internal("constraint check failed".to_string())));
        }

        let timestamp = self.services.timestamps.timestamp();
        let branch = self.branch().to_string();
        self.staging
            .commit(None, None, timestamp, author, comment)
            .map_err(|err| match err {
                IndexError::CycleDetected(message) => SnowowlError::CycleDetected(message),
                other => {
                    tracing::error!(
                        branch = %branch,
                        timestamp,
                        "Commit failed: {}",
                        other
                    );
                    SnowowlError::Internal(other.to_string())
                }
            })
    }

    /// Discards every staged change and closes the transaction.
    pub fn rollback(&mut self) {
        self.staging.reset();
        self.resolved.clear();
        self.obligations.clear();
        self.closed = true;
    }

    /// Stages the removal of every document of every mapped kind.
    pub fn clear_contents(&mut self) -> Result<()> {
        self.ensure_open()?;
        let searcher = self.searcher()?;
        let kinds = self.index.mappings().kinds().to_vec();
        for kind in kinds {
            for page in searcher.scroll(kind, CLEAR_PAGE_SIZE) {
                for doc in page.map_err(map_index_error)? {
                    self.delete(doc, true)?;
                }
            }
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(SnowowlError::IllegalState(
                "Transaction has already been closed".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Translates an index error outside of commit.
pub(crate) fn map_index_error(err: IndexError) -> SnowowlError {
    match err {
        IndexError::CycleDetected(message) => SnowowlError::CycleDetected(message),
        IndexError::BranchNotFound(path) => SnowowlError::ComponentNotFound {
            doc_type: "branch".to_string(),
            ids: vec![path],
        },
        IndexError::BranchExists(path) => SnowowlError::AlreadyExists {
            doc_type: "branch".to_string(),
            id: path,
        },
        IndexError::InvalidArgument(message) => SnowowlError::bad_request(message),
        other => SnowowlError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        make_concept, make_description, make_observed_repository, make_repository, TestDoc,
        CONCEPT, DESCRIPTION,
    };
    use crate::{DatastoreLockManager, Repository};
    use snowowl_index::{PreCommitHook, Result as IndexResult, MAIN};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::thread;

    fn seed(repository: &Repository<TestDoc>, docs: Vec<TestDoc>) {
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        for doc in docs {
            tx.add(doc).unwrap();
        }
        tx.commit("test", "seed", None).unwrap().unwrap();
    }

    fn stored(repository: &Repository<TestDoc>, kind: DocumentKind, id: &str) -> Option<TestDoc> {
        repository.index().read(MAIN).unwrap().get(kind, id).unwrap()
    }

    #[test]
    fn test_add_rejects_unmapped_kind() {
        let repository = make_repository();
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        let mut doc = make_concept("100005");
        doc.kind = DocumentKind("CodeSystem");

        assert!(matches!(
            tx.add(doc),
            Err(SnowowlError::UnsupportedOperation(_))
        ));
        assert!(!tx.is_dirty());
    }

    #[test]
    fn test_noop_commit_returns_none() {
        let (repository, sink) = make_observed_repository();
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();

        assert_eq!(tx.commit("test", "nothing", None).unwrap(), None);
        assert!(sink.events().is_empty());
        assert!(repository.index().commits(MAIN).unwrap().is_empty());
    }

    #[test]
    fn test_commit_publishes_notification() {
        let (repository, sink) = make_observed_repository();
        let mut tx = repository.open_transaction(MAIN, "alice").unwrap();
        tx.add(make_concept("100005")).unwrap();
        tx.add(make_description("1001", "100005", "Concept")).unwrap();
        let commit = tx.commit("alice", "New concept", None).unwrap().unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].commit_id, commit.id);
        assert_eq!(events[0].repository_id, "testStore");
        assert_eq!(events[0].new_components.len(), 2);
        assert!(events[0]
            .new_components
            .contains(&ObjectId::new(DESCRIPTION, "1001")));
        assert!(!tx.is_dirty());
    }

    #[test]
    fn test_update_of_new_object_stays_new() {
        let repository = make_repository();
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        let original = make_description("1001", "100005", "First");
        tx.add(original.clone()).unwrap();
        tx.update(original, make_description("1001", "100005", "Second"))
            .unwrap();

        let key = ObjectId::new(DESCRIPTION, "1001");
        assert!(tx.staging().is_new(&key));
        assert!(!tx.staging().is_changed(&key));
        assert_eq!(tx.lookup_one(DESCRIPTION, "1001").unwrap().term, "Second");
    }

    #[test]
    fn test_update_of_committed_object_is_change() {
        let repository = make_repository();
        seed(&repository, vec![make_description("1001", "100005", "First")]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        let old = tx.lookup_one(DESCRIPTION, "1001").unwrap();
        let mut new = old.clone();
        new.term = "Second".to_string();
        tx.update(old, new).unwrap();

        let commit = tx.commit("test", "edit", None).unwrap().unwrap();
        assert_eq!(
            commit.components(snowowl_index::ChangeKind::Changed).len(),
            1
        );
        assert_eq!(stored(&repository, DESCRIPTION, "1001").unwrap().term, "Second");
    }

    #[test]
    fn test_lookup_missing_fails() {
        let repository = make_repository();
        seed(&repository, vec![make_concept("100005")]);
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();

        let err = tx.lookup(CONCEPT, &["100005", "73211009"]).unwrap_err();
        match err {
            SnowowlError::ComponentNotFound { doc_type, ids } => {
                assert_eq!(doc_type, "Concept");
                assert_eq!(ids, vec!["73211009".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            tx.lookup_if_exists(CONCEPT, &["100005", "73211009"]).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_lookup_hides_staged_removal() {
        let repository = make_repository();
        seed(&repository, vec![make_concept("100005")]);
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();

        let doc = tx.lookup_one(CONCEPT, "100005").unwrap();
        tx.delete(doc, false).unwrap();
        assert!(tx.lookup_if_exists(CONCEPT, &["100005"]).unwrap().is_empty());
    }

    #[test]
    fn test_ensure_unique_violation_writes_nothing() {
        let repository = make_repository();
        seed(&repository, vec![make_concept("100005")]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_concept("73211009")).unwrap();
        tx.add(make_description("1001", "73211009", "Diabetes")).unwrap();
        tx.ensure_unique(CONCEPT, ["100005"]);

        let err = tx.commit("test", "duplicate", None).unwrap_err();
        match err {
            SnowowlError::AlreadyExists { doc_type, id } => {
                assert_eq!(doc_type, "Concept");
                assert_eq!(id, "100005");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(stored(&repository, CONCEPT, "73211009").is_none());
        assert!(stored(&repository, DESCRIPTION, "1001").is_none());
        assert!(!tx.is_dirty());
        assert_eq!(repository.index().commits(MAIN).unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_unique_ignores_root_sentinel() {
        let repository = make_repository();
        seed(&repository, vec![make_concept(crate::ROOT_ID)]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_concept("100005")).unwrap();
        tx.ensure_unique(CONCEPT, [crate::ROOT_ID]);
        assert!(tx.commit("test", "root", None).unwrap().is_some());
    }

    #[test]
    fn test_ensure_present_missing() {
        let repository = make_repository();
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_description("1001", "100005", "Orphan")).unwrap();
        tx.ensure_present(CONCEPT, ["100005"]);

        let err = tx.commit("test", "orphan", None).unwrap_err();
        assert!(matches!(
            err,
            SnowowlError::ComponentNotFound { ref ids, .. } if ids == &vec!["100005".to_string()]
        ));
        assert!(stored(&repository, DESCRIPTION, "1001").is_none());
    }

    #[test]
    fn test_ensure_present_satisfied_by_staged_and_stored() {
        let repository = make_repository();
        seed(&repository, vec![make_concept("100005")]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_concept("73211009")).unwrap();
        tx.add(make_description("1001", "73211009", "Staged parent")).unwrap();
        tx.add(make_description("1002", "100005", "Stored parent")).unwrap();
        tx.ensure_present(CONCEPT, ["73211009", "100005"]);

        assert!(tx.validate().is_ok());
        assert!(tx.commit("test", "ok", None).unwrap().is_some());
    }

    #[test]
    fn test_delete_of_referenced_component_fails() {
        let repository = make_repository();
        seed(&repository, vec![make_concept("100005")]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        let doc = tx.lookup_one(CONCEPT, "100005").unwrap();
        tx.delete(doc, false).unwrap();
        tx.add(make_description("1001", "100005", "Dangling")).unwrap();
        tx.ensure_present(CONCEPT, ["100005"]);

        let violations = tx.validate().unwrap_err();
        assert_eq!(violations.len(), 1);

        let err = tx.commit("test", "dangling", None).unwrap_err();
        match err {
            SnowowlError::BadRequest { ids, .. } => assert_eq!(ids, vec!["100005".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(stored(&repository, CONCEPT, "100005").is_some());
    }

    #[test]
    fn test_delete_refused_by_policy() {
        let repository = make_repository()
            .with_deletion_policy(Arc::new(|doc: &TestDoc| !doc.released));
        let mut released = make_concept("100005");
        released.released = true;
        seed(&repository, vec![released]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        let doc = tx.lookup_one(CONCEPT, "100005").unwrap();
        let err = tx.delete(doc.clone(), false).unwrap_err();

        assert!(matches!(err, SnowowlError::Conflict(_)));
        assert_eq!(err.status(), 409);
        assert!(!tx.is_dirty());
        assert_eq!(stored(&repository, CONCEPT, "100005"), Some(doc.clone()));

        tx.delete(doc, true).unwrap();
        tx.commit("test", "forced", None).unwrap();
        assert!(stored(&repository, CONCEPT, "100005").is_none());
    }

    struct CycleHook;

    impl PreCommitHook<TestDoc> for CycleHook {
        fn before_commit(
            &self,
            staging: &StagingArea<TestDoc>,
            _searcher: &RevisionSearcher<TestDoc>,
        ) -> IndexResult<()> {
            if staging.new_objects().any(|doc| doc.id == "1001") {
                Err(IndexError::CycleDetected("1001 -> 1001".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_cycle_detected_is_not_wrapped() {
        let repository = make_repository();
        repository.index().register_hook(Arc::new(CycleHook)).unwrap();

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_description("1001", "100005", "Cyclic")).unwrap();
        let err = tx.commit("test", "cycle", None).unwrap_err();

        assert!(matches!(err, SnowowlError::CycleDetected(_)));
        assert!(stored(&repository, DESCRIPTION, "1001").is_none());
    }

    struct FixedTimestamp(AtomicI64);

    impl TimestampProvider for FixedTimestamp {
        fn timestamp(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_index_failure_is_wrapped() {
        let repository =
            make_repository().with_timestamps(Arc::new(FixedTimestamp(AtomicI64::new(5))));
        seed(&repository, vec![make_concept("100005")]);

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_concept("73211009")).unwrap();
        let err = tx.commit("test", "same timestamp", None).unwrap_err();

        assert!(matches!(err, SnowowlError::Internal(ref msg) if msg.contains("not after head")));
        assert!(!tx.is_dirty());
        assert!(stored(&repository, CONCEPT, "73211009").is_none());
    }

    #[test]
    fn test_commit_waits_for_branch_lock() {
        let lock_manager = Arc::new(DatastoreLockManager::new());
        let repository = make_repository()
            .with_lock_manager(lock_manager.clone())
            .with_config(TransactionConfig {
                lock_timeout: Duration::from_millis(50),
            });

        let holder = DatastoreLockContext::new("bob", "classify", ROOT_LOCK_CONTEXT);
        let target = DatastoreLockTarget::new("testStore", MAIN);
        lock_manager
            .lock(&holder, Duration::from_millis(10), &target)
            .unwrap();

        let mut tx = repository.open_transaction(MAIN, "alice").unwrap();
        tx.add(make_concept("100005")).unwrap();
        tx.ensure_present(CONCEPT, ["999999"]);
        let err = tx.commit("alice", "blocked", None).unwrap_err();
        assert!(matches!(err, SnowowlError::Internal(ref msg) if msg.contains("Failed to acquire lock")));
        assert!(!tx.is_dirty());
        assert!(tx.validate().is_ok());

        lock_manager.unlock(&holder, &target).unwrap();
        tx.add(make_concept("100005")).unwrap();
        assert!(tx.commit("alice", "unblocked", None).unwrap().is_some());
        assert!(lock_manager.holder(&target).is_none());
        assert!(stored(&repository, CONCEPT, "100005").is_some());
    }

    #[test]
    fn test_commit_waits_for_same_user_on_other_context() {
        let lock_manager = Arc::new(DatastoreLockManager::new());
        let repository = make_repository()
            .with_lock_manager(lock_manager.clone())
            .with_config(TransactionConfig {
                lock_timeout: Duration::from_millis(50),
            });

        let holder = DatastoreLockContext::new("alice", COMMIT_LOCK_DESCRIPTION, ROOT_LOCK_CONTEXT);
        let target = DatastoreLockTarget::new("testStore", MAIN);
        lock_manager
            .lock(&holder, Duration::from_millis(10), &target)
            .unwrap();

        let mut tx = repository.open_transaction(MAIN, "alice").unwrap();
        tx.add(make_concept("100005")).unwrap();
        assert!(tx.commit("alice", "blocked", None).is_err());
        assert!(stored(&repository, CONCEPT, "100005").is_none());
        lock_manager.unlock(&holder, &target).unwrap();
    }

    struct SlowHook;

    impl PreCommitHook<TestDoc> for SlowHook {
        fn before_commit(
            &self,
            _staging: &StagingArea<TestDoc>,
            _searcher: &RevisionSearcher<TestDoc>,
        ) -> IndexResult<()> {
            thread::sleep(Duration::from_millis(100));
            Ok(())
        }
    }

    #[test]
    fn test_concurrent_commits_of_same_user_are_serialized() {
        let repository = Arc::new(make_repository().with_config(TransactionConfig {
            lock_timeout: Duration::from_secs(5),
        }));
        repository.index().register_hook(Arc::new(SlowHook)).unwrap();

        let handles: Vec<_> = (0..2)
            .map(|n| {
                let repository = Arc::clone(&repository);
                thread::spawn(move || {
                    let mut tx = repository.open_transaction(MAIN, "alice").unwrap();
                    let mut doc = make_concept("100005");
                    doc.term = format!("writer {}", n);
                    tx.add(doc).unwrap();
                    tx.ensure_unique(CONCEPT, ["100005"]);
                    tx.commit("alice", "race", None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| matches!(err, SnowowlError::AlreadyExists { .. } | SnowowlError::Conflict(_))));
        assert_eq!(repository.index().commits(MAIN).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_commits_never_both_create_same_id() {
        let repository = Arc::new(make_repository().with_config(TransactionConfig {
            lock_timeout: Duration::from_secs(5),
        }));

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let repository = Arc::clone(&repository);
                thread::spawn(move || {
                    let mut tx = repository
                        .open_transaction(MAIN, &format!("user{}", n))
                        .unwrap();
                    let mut doc = make_concept("100005");
                    doc.term = format!("writer {}", n);
                    tx.add(doc).unwrap();
                    tx.ensure_unique(CONCEPT, ["100005"]);
                    tx.commit("test", "race", None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| matches!(err, SnowowlError::AlreadyExists { .. })));
        assert_eq!(repository.index().commits(MAIN).unwrap().len(), 1);
    }

    #[test]
    fn test_rollback_closes_transaction() {
        let repository = make_repository();
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_concept("100005")).unwrap();
        tx.rollback();

        assert!(tx.is_closed());
        assert!(!tx.is_dirty());
        assert!(matches!(
            tx.add(make_concept("73211009")),
            Err(SnowowlError::IllegalState(_))
        ));
        assert!(matches!(
            tx.commit("test", "closed", None),
            Err(SnowowlError::IllegalState(_))
        ));
        assert!(stored(&repository, CONCEPT, "100005").is_none());
    }

    #[test]
    fn test_clear_contents_removes_every_kind() {
        let repository = make_repository();
        seed(
            &repository,
            vec![
                make_concept("100005"),
                make_concept("73211009"),
                make_description("1001", "100005", "A"),
            ],
        );

        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.clear_contents().unwrap();
        let commit = tx.commit("test", "reset", None).unwrap().unwrap();

        assert_eq!(commit.components(snowowl_index::ChangeKind::Removed).len(), 3);
        let searcher = repository.index().read(MAIN).unwrap();
        assert_eq!(searcher.scroll(CONCEPT, 10).count(), 0);
        assert_eq!(searcher.scroll(DESCRIPTION, 10).count(), 0);
    }

    #[test]
    fn test_repeated_commits_on_same_context() {
        let repository = make_repository();
        let mut tx = repository.open_transaction(MAIN, "test").unwrap();
        tx.add(make_concept("100005")).unwrap();
        let first = tx.commit("test", "first", None).unwrap().unwrap();
        tx.add(make_concept("73211009")).unwrap();
        let second = tx.commit("test", "second", Some("import")).unwrap().unwrap();

        assert!(second.timestamp > first.timestamp);
        assert_eq!(repository.index().commits(MAIN).unwrap().len(), 2);
    }
}
