//! Policies deciding whether a document may be deleted.

use std::sync::Arc;

/// Decides whether a document may be deleted without forcing.
pub trait ComponentDeletionPolicy<D>: Send + Sync {
    /// Returns true if `doc` may be deleted.
    fn can_delete(&self, doc: &D) -> bool;
}

/// Allows every deletion.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl<D> ComponentDeletionPolicy<D> for AllowAll {
    fn can_delete(&self, _doc: &D) -> bool {
        true
    }
}

/// Allows a deletion only if every registered policy allows it.
pub struct CompositeDeletionPolicy<D> {
    policies: Vec<Arc<dyn ComponentDeletionPolicy<D>>>,
}

impl<D> Default for CompositeDeletionPolicy<D> {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
        }
    }
}

impl<D> CompositeDeletionPolicy<D> {
    /// Creates an empty composite, which allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a policy.
    pub fn with(mut self, policy: Arc<dyn ComponentDeletionPolicy<D>>) -> Self {
        self.policies.push(policy);
        self
    }
}

impl<D> ComponentDeletionPolicy<D> for CompositeDeletionPolicy<D> {
    fn can_delete(&self, doc: &D) -> bool {
        self.policies.iter().all(|policy| policy.can_delete(doc))
    }
}

impl<D, F> ComponentDeletionPolicy<D> for F
where
    F: Fn(&D) -> bool + Send + Sync,
{
    fn can_delete(&self, doc: &D) -> bool {
        self(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_is_logical_and() {
        let policy: CompositeDeletionPolicy<u32> = CompositeDeletionPolicy::new()
            .with(Arc::new(AllowAll))
            .with(Arc::new(|n: &u32| *n % 2 == 0))
            .with(Arc::new(|n: &u32| *n < 10));

        assert!(policy.can_delete(&4));
        assert!(!policy.can_delete(&3));
        assert!(!policy.can_delete(&12));
        assert!(CompositeDeletionPolicy::<u32>::new().can_delete(&7));
    }
}
