//! # snowowl-index
//!
//! A branch-aware revision document store.
//!
//! Documents are never updated in place: every commit writes new revisions
//! stamped with the commit timestamp, so any branch can be read as of any
//! point in its history. Branches see their parent's content as of the
//! moment they were created.
//!
//! ```
//! use snowowl_index::{DocumentKind, Mappings, Revision, RevisionIndex, MAIN};
//!
//! #[derive(Clone)]
//! struct Note {
//!     id: String,
//! }
//!
//! impl Revision for Note {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!     fn kind(&self) -> DocumentKind {
//!         DocumentKind("note")
//!     }
//! }
//!
//! let index = RevisionIndex::new(Mappings::new([DocumentKind("note")]));
//! let mut staging = index.prepare_commit(MAIN).unwrap();
//! staging.stage_new(Note { id: "1".into() }).unwrap();
//! staging.commit(None, None, 1, "admin", "first note").unwrap();
//!
//! let searcher = index.read(MAIN).unwrap();
//! assert!(searcher.get(DocumentKind("note"), "1").unwrap().is_some());
//! ```

#![warn(missing_docs)]

mod branch;
mod commit;
mod error;
mod hooks;
mod index;
mod mapping;
mod revision;
mod searcher;
mod staging;

#[cfg(test)]
mod test_support;

pub use branch::{child_path, RevisionBranch, MAIN, SEPARATOR};
pub use commit::{ChangeKind, Commit, CommitDetail};
pub use error::{IndexError, Result};
pub use hooks::PreCommitHook;
pub use index::RevisionIndex;
pub use mapping::Mappings;
pub use revision::{DocumentKind, ObjectId, Revision};
pub use searcher::{Hits, Query, RevisionSearcher, Scroll};
pub use staging::StagingArea;
