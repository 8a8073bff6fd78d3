//! Registry of document kinds a repository can store.

use crate::DocumentKind;

/// The set of revision document kinds known to an index.
///
/// Built once when the repository is set up and passed to the index; there
/// is no global registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    kinds: Vec<DocumentKind>,
}

impl Mappings {
    /// Creates mappings for the given kinds.
    pub fn new(kinds: impl IntoIterator<Item = DocumentKind>) -> Self {
        let mut mappings = Self::default();
        for kind in kinds {
            mappings.register(kind);
        }
        mappings
    }

    /// Registers a kind. Registering the same kind twice has no effect.
    pub fn register(&mut self, kind: DocumentKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    /// Returns true if `kind` is registered.
    pub fn contains(&self, kind: DocumentKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> &[DocumentKind] {
        &self.kinds
    }

    /// Looks up a registered kind by name.
    pub fn get(&self, name: &str) -> Option<DocumentKind> {
        self.kinds.iter().copied().find(|kind| kind.name() == name)
    }
}
