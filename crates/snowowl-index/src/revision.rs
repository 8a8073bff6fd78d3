//! Revision documents and their type identities.

use serde::Serialize;
use std::fmt;

/// Type tag of a revision document, e.g. `concept` or `member`.
///
/// Kinds are compared by name; every kind a repository stores must be
/// registered in its [`Mappings`](crate::Mappings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentKind(pub &'static str);

impl DocumentKind {
    /// Name of the kind.
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identifies one document of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId {
    /// Kind of the document.
    pub kind: DocumentKind,
    /// Identifier of the document within its kind.
    pub id: String,
}

impl ObjectId {
    /// Creates an object id.
    pub fn new(kind: DocumentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A document stored in a [`RevisionIndex`](crate::RevisionIndex).
///
/// Revisions are immutable once committed. A later commit on the same id
/// supersedes the earlier revision instead of changing it.
pub trait Revision: Clone + Send + Sync + 'static {
    /// Identifier of the document, unique within its kind and branch.
    fn id(&self) -> &str;

    /// Kind of the document.
    fn kind(&self) -> DocumentKind;

    /// The object this document belongs to.
    ///
    /// Commit details group changed documents by container, so that a change
    /// to a description is reported against its concept. Top level documents
    /// return their own id.
    fn container(&self) -> ObjectId {
        ObjectId::new(self.kind(), self.id())
    }

    /// Key of the document in the index.
    fn object_id(&self) -> ObjectId {
        ObjectId::new(self.kind(), self.id())
    }
}
