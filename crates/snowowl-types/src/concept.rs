//! Concept rows.

use crate::{DefinitionStatus, SctId};

/// A row of an RF2 concept file (`sct2_Concept_*.txt`).
///
/// # Examples
///
/// ```
/// use snowowl_types::{Rf2Concept, DefinitionStatus};
///
/// let concept = Rf2Concept {
///     id: 73211009,
///     effective_time: Some(20020131),
///     active: true,
///     module_id: 900000000000207008,
///     definition_status_id: DefinitionStatus::PRIMITIVE_ID,
/// };
///
/// assert!(concept.is_primitive());
/// assert!(concept.is_released());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rf2Concept {
    /// Unique identifier for this concept (SCTID).
    pub id: SctId,
    /// Effective date in `yyyyMMdd` form, `None` for unpublished rows.
    pub effective_time: Option<u32>,
    /// Whether this concept is active.
    pub active: bool,
    /// The module containing this concept.
    pub module_id: SctId,
    /// Primitive or fully defined.
    pub definition_status_id: SctId,
}

impl Rf2Concept {
    /// Returns the definition status enum value.
    pub fn definition_status(&self) -> Option<DefinitionStatus> {
        DefinitionStatus::from_id(self.definition_status_id)
    }

    /// Returns true if this concept is primitively defined.
    pub fn is_primitive(&self) -> bool {
        self.definition_status_id == DefinitionStatus::PRIMITIVE_ID
    }

    /// Returns true if the row carries an effective time.
    pub fn is_released(&self) -> bool {
        self.effective_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpublished_concept() {
        let concept = Rf2Concept {
            id: 100005,
            effective_time: None,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::FULLY_DEFINED_ID,
        };

        assert!(!concept.is_released());
        assert!(!concept.is_primitive());
        assert_eq!(concept.definition_status(), Some(DefinitionStatus::FullyDefined));
    }
}
