//! Pre-commit hooks.

use crate::{Result, RevisionSearcher, StagingArea};

/// Hook run by [`StagingArea::commit`] before any staged change is written.
///
/// Hooks see the staged changes and a searcher pinned at the current branch
/// head. Returning an error aborts the commit; `IndexError::CycleDetected`
/// is the conventional answer to a revision graph that would become cyclic.
pub trait PreCommitHook<D>: Send + Sync {
    /// Inspects the staged changes.
    fn before_commit(&self, staging: &StagingArea<D>, searcher: &RevisionSearcher<D>)
        -> Result<()>;
}
