//! Whether a branch already holds content.
//!
//! Delta releases only make sense on top of existing content, so the importer
//! asks a provider before reading a delta archive.

use std::sync::Arc;

use snowowl_core::Repository;
use snowowl_index::Query;

use crate::documents::{SnomedDocument, CONCEPT};
use crate::types::Rf2Result;

/// Tells whether terminology content is available on a branch.
pub trait ContentAvailabilityInfoProvider: Send + Sync {
    /// Returns true if `branch` has content a delta can be applied to.
    fn is_available(&self, branch: &str) -> Rf2Result<bool>;
}

impl<F> ContentAvailabilityInfoProvider for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_available(&self, branch: &str) -> Rf2Result<bool> {
        Ok(self(branch))
    }
}

/// Content is available once a branch holds at least one concept.
pub struct IndexContentAvailability {
    repository: Arc<Repository<SnomedDocument>>,
}

impl IndexContentAvailability {
    /// Checks branches of `repository`.
    pub fn new(repository: Arc<Repository<SnomedDocument>>) -> Self {
        Self { repository }
    }
}

impl ContentAvailabilityInfoProvider for IndexContentAvailability {
    fn is_available(&self, branch: &str) -> Rf2Result<bool> {
        let hits = self
            .repository
            .index()
            .read(branch)?
            .search(&Query::select(CONCEPT).limit(1))?;
        Ok(hits.total > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::snomed_repository;
    use snowowl_types::{well_known, DefinitionStatus, Rf2Component, Rf2Concept};

    #[test]
    fn test_empty_branch_has_no_content() {
        let repository = Arc::new(snomed_repository("snomedStore"));
        let availability = IndexContentAvailability::new(repository);
        assert!(!availability.is_available("MAIN").unwrap());
    }

    #[test]
    fn test_branch_with_concept_has_content() {
        let repository = Arc::new(snomed_repository("snomedStore"));
        let concept = Rf2Component::Concept(Rf2Concept {
            id: 138875005,
            effective_time: Some(20020131),
            active: true,
            module_id: well_known::SNOMED_CT_CORE_MODULE,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        });
        let mut tx = repository.open_transaction("MAIN", "importer").unwrap();
        tx.add(SnomedDocument::from_rf2(&concept, None)).unwrap();
        tx.commit("importer", "root", None).unwrap();

        let availability = IndexContentAvailability::new(repository);
        assert!(availability.is_available("MAIN").unwrap());
    }

    #[test]
    fn test_closure_provider() {
        let unavailable = |_: &str| false;
        assert!(!unavailable.is_available("MAIN").unwrap());
    }
}
