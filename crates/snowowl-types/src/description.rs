//! Description rows.

use crate::{DescriptionType, SctId};

/// A row of an RF2 description or text definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rf2Description {
    /// Unique identifier for this description.
    pub id: SctId,
    /// Effective date in `yyyyMMdd` form, `None` for unpublished rows.
    pub effective_time: Option<u32>,
    /// Whether this description is active.
    pub active: bool,
    /// The module containing this description.
    pub module_id: SctId,
    /// The concept this description belongs to.
    pub concept_id: SctId,
    /// Language code, e.g. `en`.
    pub language_code: String,
    /// FSN, synonym or definition.
    pub type_id: SctId,
    /// The description text.
    pub term: String,
    /// Case significance of the term.
    pub case_significance_id: SctId,
}

impl Rf2Description {
    /// Returns the description type enum value.
    pub fn description_type(&self) -> Option<DescriptionType> {
        DescriptionType::from_id(self.type_id)
    }

    /// Returns true if this is a Fully Specified Name.
    pub fn is_fsn(&self) -> bool {
        self.type_id == DescriptionType::FSN_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_type_helpers() {
        let description = Rf2Description {
            id: 754786011,
            effective_time: Some(20020131),
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id: DescriptionType::FSN_ID,
            term: "Diabetes mellitus (disorder)".to_string(),
            case_significance_id: 900000000000448009,
        };

        assert!(description.is_fsn());
        assert_eq!(description.description_type(), Some(DescriptionType::Fsn));
    }
}
