//! Deferred uniqueness and presence constraints of a transaction.

use crate::SnowowlError;
use snowowl_index::{
    DocumentKind, ObjectId, Result as IndexResult, Revision, RevisionSearcher, StagingArea,
};
use std::collections::{BTreeMap, BTreeSet};

/// Id excluded from uniqueness checks.
pub const ROOT_ID: &str = "ROOT";

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// An id required to be new already exists.
    AlreadyExists {
        /// Document kind.
        kind: DocumentKind,
        /// First offending id.
        id: String,
    },
    /// Ids required to be present are staged for removal.
    ReferencedComponentsRemoved {
        /// Document kind.
        kind: DocumentKind,
        /// Every offending id.
        ids: Vec<String>,
    },
    /// Ids required to be present neither exist nor are staged.
    Missing {
        /// Document kind.
        kind: DocumentKind,
        /// Every missing id.
        ids: Vec<String>,
    },
    /// The store could not be queried, so the constraints were not checked.
    CheckFailed(String),
}

impl From<ConstraintViolation> for SnowowlError {
    fn from(violation: ConstraintViolation) -> Self {
        match violation {
            ConstraintViolation::AlreadyExists { kind, id } => SnowowlError::AlreadyExists {
                doc_type: kind.to_string(),
                id,
            },
            ConstraintViolation::ReferencedComponentsRemoved { kind, ids } => {
                SnowowlError::BadRequest {
                    message: format!(
                        "The transaction would delete {} components that are still referenced: {}",
                        kind,
                        ids.join(", ")
                    ),
                    ids,
                }
            }
            ConstraintViolation::Missing { kind, ids } => SnowowlError::ComponentNotFound {
                doc_type: kind.to_string(),
                ids,
            },
            ConstraintViolation::CheckFailed(message) => SnowowlError::Internal(message),
        }
    }
}

/// Constraints registered during a transaction and checked once at commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingObligations {
    unique: BTreeMap<DocumentKind, BTreeSet<String>>,
    present: BTreeMap<DocumentKind, BTreeSet<String>>,
}

impl PendingObligations {
    /// Requires that none of `ids` exist in the store at commit time.
    pub fn ensure_unique<I, S>(&mut self, kind: DocumentKind, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique
            .entry(kind)
            .or_default()
            .extend(ids.into_iter().map(Into::into));
    }

    /// Requires that all of `ids` exist or are staged at commit time.
    pub fn ensure_present<I, S>(&mut self, kind: DocumentKind, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.present
            .entry(kind)
            .or_default()
            .extend(ids.into_iter().map(Into::into));
    }

    /// Returns true if no constraint is registered.
    pub fn is_empty(&self) -> bool {
        self.unique.values().all(BTreeSet::is_empty) && self.present.values().all(BTreeSet::is_empty)
    }

    /// Drops every registered constraint.
    pub fn clear(&mut self) {
        self.unique.clear();
        self.present.clear();
    }

    /// Checks every constraint against the staged changes and the store.
    ///
    /// Uniqueness is checked before presence. Presence first rejects ids
    /// staged for removal, then accepts ids staged as new or changed, and
    /// finally looks the remaining ids up in the store.
    pub fn check<D: Revision>(
        &self,
        staging: &StagingArea<D>,
        searcher: &RevisionSearcher<D>,
    ) -> IndexResult<Vec<ConstraintViolation>> {
        let mut violations = Vec::new();

        for (kind, ids) in &self.unique {
            let candidates: Vec<&str> = ids
                .iter()
                .map(String::as_str)
                .filter(|id| *id != ROOT_ID)
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let existing: BTreeSet<String> = searcher
                .get_all(*kind, candidates.as_slice())?
                .iter()
                .map(|doc| doc.id().to_string())
                .collect();
            if let Some(id) = candidates.iter().find(|id| existing.contains(**id)) {
                violations.push(ConstraintViolation::AlreadyExists {
                    kind: *kind,
                    id: id.to_string(),
                });
            }
        }

        for (kind, ids) in &self.present {
            let removed: Vec<String> = ids
                .iter()
                .filter(|id| staging.is_removed(&ObjectId::new(*kind, id.as_str())))
                .cloned()
                .collect();
            if !removed.is_empty() {
                violations.push(ConstraintViolation::ReferencedComponentsRemoved {
                    kind: *kind,
                    ids: removed,
                });
                continue;
            }

            let unresolved: Vec<&str> = ids
                .iter()
                .map(String::as_str)
                .filter(|id| {
                    let key = ObjectId::new(*kind, *id);
                    !(staging.is_new(&key) || staging.is_changed(&key))
                })
                .collect();
            if unresolved.is_empty() {
                continue;
            }

            let found: BTreeSet<String> = searcher
                .get_all(*kind, unresolved.as_slice())?
                .iter()
                .map(|doc| doc.id().to_string())
                .collect();
            let missing: Vec<String> = unresolved
                .into_iter()
                .filter(|id| !found.contains(*id))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                violations.push(ConstraintViolation::Missing {
                    kind: *kind,
                    ids: missing,
                });
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obligations_accumulate_and_clear() {
        let mut obligations = PendingObligations::default();
        assert!(obligations.is_empty());

        obligations.ensure_unique(DocumentKind("concept"), ["100005"]);
        obligations.ensure_present(DocumentKind("concept"), vec!["73211009".to_string()]);
        assert!(!obligations.is_empty());

        obligations.clear();
        assert!(obligations.is_empty());
    }

    #[test]
    fn test_violation_to_error() {
        let err: SnowowlError = ConstraintViolation::ReferencedComponentsRemoved {
            kind: DocumentKind("concept"),
            ids: vec!["100005".to_string()],
        }
        .into();
        match err {
            SnowowlError::BadRequest { message, ids } => {
                assert!(message.contains("still referenced"));
                assert_eq!(ids, vec!["100005".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
