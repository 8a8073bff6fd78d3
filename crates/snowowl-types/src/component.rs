//! A parsed RF2 row of any content type.

use crate::{Rf2Concept, Rf2Description, Rf2RefsetMember, Rf2Relationship, SctId};

/// One parsed RF2 row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Rf2Component {
    /// A concept row.
    Concept(Rf2Concept),
    /// A description or text definition row.
    Description(Rf2Description),
    /// A relationship or concrete value relationship row.
    Relationship(Rf2Relationship),
    /// A reference set member row.
    Member(Rf2RefsetMember),
}

impl Rf2Component {
    /// Component identifier as written in the release file.
    pub fn id(&self) -> String {
        match self {
            Self::Concept(c) => c.id.to_string(),
            Self::Description(d) => d.id.to_string(),
            Self::Relationship(r) => r.id.to_string(),
            Self::Member(m) => m.id.clone(),
        }
    }

    /// Effective time of the row, `None` when unpublished.
    pub fn effective_time(&self) -> Option<u32> {
        match self {
            Self::Concept(c) => c.effective_time,
            Self::Description(d) => d.effective_time,
            Self::Relationship(r) => r.effective_time,
            Self::Member(m) => m.effective_time,
        }
    }

    /// Whether the row is active.
    pub fn active(&self) -> bool {
        match self {
            Self::Concept(c) => c.active,
            Self::Description(d) => d.active,
            Self::Relationship(r) => r.active,
            Self::Member(m) => m.active,
        }
    }

    /// Module of the row.
    pub fn module_id(&self) -> SctId {
        match self {
            Self::Concept(c) => c.module_id,
            Self::Description(d) => d.module_id,
            Self::Relationship(r) => r.module_id,
            Self::Member(m) => m.module_id,
        }
    }

    /// The concept that owns this row.
    ///
    /// Concepts own themselves, descriptions their concept, relationships
    /// their source. Members return `None`; they are grouped by their
    /// referenced component instead.
    pub fn container_id(&self) -> Option<SctId> {
        match self {
            Self::Concept(c) => Some(c.id),
            Self::Description(d) => Some(d.concept_id),
            Self::Relationship(r) => Some(r.source_id),
            Self::Member(_) => None,
        }
    }
}
