//! SNOMED CT revision documents.
//!
//! Every imported RF2 row becomes one [`SnomedDocument`] revision. Concepts
//! act as containers: descriptions and relationships belong to their concept,
//! reference set members to the component they reference.

use serde::Serialize;
use snowowl_core::{CompositeDeletionPolicy, ComponentDeletionPolicy, Repository};
use snowowl_index::{DocumentKind, Mappings, ObjectId, Revision};
use snowowl_types::{
    category_of, ComponentCategory, ConcreteValue, RefsetType, Rf2Component, Rf2Concept,
    Rf2Description, Rf2RefsetMember, Rf2Relationship, SctId,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Concept documents.
pub const CONCEPT: DocumentKind = DocumentKind("concept");
/// Description documents.
pub const DESCRIPTION: DocumentKind = DocumentKind("description");
/// Relationship documents.
pub const RELATIONSHIP: DocumentKind = DocumentKind("relationship");
/// Reference set member documents.
pub const MEMBER: DocumentKind = DocumentKind("member");
/// Reference sets, used when reporting visited components.
pub const REFSET: DocumentKind = DocumentKind("refset");

/// Import order of the document kinds inside one batch.
pub const IMPORT_ORDER: [DocumentKind; 4] = [CONCEPT, DESCRIPTION, RELATIONSHIP, MEMBER];

/// Map target type of reference sets whose targets are not SNOMED CT components.
pub const UNSPECIFIED_COMPONENT_TYPE: &str = "UNSPECIFIED";

/// Index mappings of a SNOMED CT repository.
pub fn snomed_mappings() -> Mappings {
    Mappings::new(IMPORT_ORDER)
}

/// Creates a SNOMED CT repository that refuses to delete released components.
pub fn snomed_repository(id: impl Into<String>) -> Repository<SnomedDocument> {
    let policy = CompositeDeletionPolicy::new().with(Arc::new(ReleasedComponentDeletionPolicy));
    Repository::new(id, snomed_mappings()).with_deletion_policy(Arc::new(policy))
}

/// Document kind holding components of the given category.
pub fn kind_of(category: ComponentCategory) -> DocumentKind {
    match category {
        ComponentCategory::Concept => CONCEPT,
        ComponentCategory::Description => DESCRIPTION,
        ComponentCategory::Relationship => RELATIONSHIP,
    }
}

/// Document kind of an SCTID, falling back to concepts for unknown partitions.
pub fn kind_of_id(id: SctId) -> DocumentKind {
    category_of(id).map_or(CONCEPT, kind_of)
}

/// A concept revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptDocument {
    /// Concept id.
    pub id: String,
    /// Icon used when displaying the concept.
    pub icon_id: String,
    /// Search score.
    pub score: f32,
    /// Whether the concept is active.
    pub active: bool,
    /// Effective time, `None` while unpublished.
    pub effective_time: Option<u32>,
    /// Whether any revision of the concept was ever published.
    pub released: bool,
    /// Module id.
    pub module_id: String,
    /// Definition status concept id.
    pub definition_status_id: String,
    /// Reference set pattern if the concept identifies a reference set.
    pub refset_type: Option<RefsetType>,
    /// Category of the components the reference set refers to.
    pub referenced_component_type: Option<String>,
    /// Category of the map targets of a map reference set.
    pub map_target_component_type: Option<String>,
}

/// A description revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionDocument {
    /// Description id.
    pub id: String,
    /// Icon used when displaying the description.
    pub icon_id: String,
    /// Search score.
    pub score: f32,
    /// Whether the description is active.
    pub active: bool,
    /// Effective time, `None` while unpublished.
    pub effective_time: Option<u32>,
    /// Whether any revision was ever published.
    pub released: bool,
    /// Module id.
    pub module_id: String,
    /// Owning concept id.
    pub concept_id: String,
    /// Language code.
    pub language_code: String,
    /// Description type concept id.
    pub type_id: String,
    /// The term.
    pub term: String,
    /// Case significance concept id.
    pub case_significance_id: String,
}

/// A relationship revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipDocument {
    /// Relationship id.
    pub id: String,
    /// Icon used when displaying the relationship.
    pub icon_id: String,
    /// Search score.
    pub score: f32,
    /// Whether the relationship is active.
    pub active: bool,
    /// Effective time, `None` while unpublished.
    pub effective_time: Option<u32>,
    /// Whether any revision was ever published.
    pub released: bool,
    /// Module id.
    pub module_id: String,
    /// Source concept id.
    pub source_id: String,
    /// Destination concept id, absent for concrete values.
    pub destination_id: Option<String>,
    /// Concrete value, absent for concept destinations.
    pub value: Option<ConcreteValue>,
    /// Relationship group.
    pub group: u32,
    /// Attribute type concept id.
    pub type_id: String,
    /// Characteristic type concept id.
    pub characteristic_type_id: String,
    /// Modifier concept id.
    pub modifier_id: String,
}

/// A reference set member revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDocument {
    /// Member UUID.
    pub id: String,
    /// Icon used when displaying the member.
    pub icon_id: String,
    /// Search score.
    pub score: f32,
    /// Whether the member is active.
    pub active: bool,
    /// Effective time, `None` while unpublished.
    pub effective_time: Option<u32>,
    /// Whether any revision was ever published.
    pub released: bool,
    /// Module id.
    pub module_id: String,
    /// Reference set concept id.
    pub refset_id: String,
    /// Referenced component id.
    pub referenced_component_id: String,
    /// Pattern of the reference set.
    pub refset_type: RefsetType,
    /// Pattern specific values keyed by RF2 header name.
    pub properties: BTreeMap<String, String>,
}

/// Any SNOMED CT revision document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnomedDocument {
    /// A concept.
    Concept(ConceptDocument),
    /// A description.
    Description(DescriptionDocument),
    /// A relationship.
    Relationship(RelationshipDocument),
    /// A reference set member.
    Member(MemberDocument),
}

impl SnomedDocument {
    /// Builds the document for an RF2 row.
    ///
    /// `previous` is the current revision of the same component, if any;
    /// its released flag and reference set properties carry over.
    pub fn from_rf2(component: &Rf2Component, previous: Option<&SnomedDocument>) -> Self {
        let released = previous.map_or(false, SnomedDocument::is_released)
            || component.effective_time().is_some();
        match component {
            Rf2Component::Concept(row) => {
                let mut doc = concept_document(row, released);
                if let Some(SnomedDocument::Concept(previous)) = previous {
                    doc.refset_type = previous.refset_type;
                    doc.referenced_component_type = previous.referenced_component_type.clone();
                    doc.map_target_component_type = previous.map_target_component_type.clone();
                }
                SnomedDocument::Concept(doc)
            }
            Rf2Component::Description(row) => {
                SnomedDocument::Description(description_document(row, released))
            }
            Rf2Component::Relationship(row) => {
                SnomedDocument::Relationship(relationship_document(row, released))
            }
            Rf2Component::Member(row) => SnomedDocument::Member(member_document(row, released)),
        }
    }

    /// Effective time of the revision.
    pub fn effective_time(&self) -> Option<u32> {
        match self {
            Self::Concept(doc) => doc.effective_time,
            Self::Description(doc) => doc.effective_time,
            Self::Relationship(doc) => doc.effective_time,
            Self::Member(doc) => doc.effective_time,
        }
    }

    /// Whether the component was ever published.
    pub fn is_released(&self) -> bool {
        match self {
            Self::Concept(doc) => doc.released,
            Self::Description(doc) => doc.released,
            Self::Relationship(doc) => doc.released,
            Self::Member(doc) => doc.released,
        }
    }

    /// Whether the revision is active.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Concept(doc) => doc.active,
            Self::Description(doc) => doc.active,
            Self::Relationship(doc) => doc.active,
            Self::Member(doc) => doc.active,
        }
    }

    /// Returns the concept, if this is one.
    pub fn as_concept(&self) -> Option<&ConceptDocument> {
        match self {
            Self::Concept(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the description, if this is one.
    pub fn as_description(&self) -> Option<&DescriptionDocument> {
        match self {
            Self::Description(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the relationship, if this is one.
    pub fn as_relationship(&self) -> Option<&RelationshipDocument> {
        match self {
            Self::Relationship(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the member, if this is one.
    pub fn as_member(&self) -> Option<&MemberDocument> {
        match self {
            Self::Member(doc) => Some(doc),
            _ => None,
        }
    }
}

impl Revision for SnomedDocument {
    fn id(&self) -> &str {
        match self {
            Self::Concept(doc) => &doc.id,
            Self::Description(doc) => &doc.id,
            Self::Relationship(doc) => &doc.id,
            Self::Member(doc) => &doc.id,
        }
    }

    fn kind(&self) -> DocumentKind {
        match self {
            Self::Concept(_) => CONCEPT,
            Self::Description(_) => DESCRIPTION,
            Self::Relationship(_) => RELATIONSHIP,
            Self::Member(_) => MEMBER,
        }
    }

    fn container(&self) -> ObjectId {
        match self {
            Self::Concept(doc) => ObjectId::new(CONCEPT, doc.id.clone()),
            Self::Description(doc) => ObjectId::new(CONCEPT, doc.concept_id.clone()),
            Self::Relationship(doc) => ObjectId::new(CONCEPT, doc.source_id.clone()),
            Self::Member(doc) => {
                let kind = doc
                    .referenced_component_id
                    .parse()
                    .map_or(CONCEPT, kind_of_id);
                ObjectId::new(kind, doc.referenced_component_id.clone())
            }
        }
    }
}

/// Refuses to delete components that were part of a release.
///
/// Forced deletes bypass the check.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleasedComponentDeletionPolicy;

impl ComponentDeletionPolicy<SnomedDocument> for ReleasedComponentDeletionPolicy {
    fn can_delete(&self, doc: &SnomedDocument) -> bool {
        !doc.is_released()
    }
}

fn concept_document(row: &Rf2Concept, released: bool) -> ConceptDocument {
    let id = row.id.to_string();
    ConceptDocument {
        icon_id: id.clone(),
        id,
        score: 0.0,
        active: row.active,
        effective_time: row.effective_time,
        released,
        module_id: row.module_id.to_string(),
        definition_status_id: row.definition_status_id.to_string(),
        refset_type: None,
        referenced_component_type: None,
        map_target_component_type: None,
    }
}

fn description_document(row: &Rf2Description, released: bool) -> DescriptionDocument {
    DescriptionDocument {
        id: row.id.to_string(),
        icon_id: row.concept_id.to_string(),
        score: 0.0,
        active: row.active,
        effective_time: row.effective_time,
        released,
        module_id: row.module_id.to_string(),
        concept_id: row.concept_id.to_string(),
        language_code: row.language_code.clone(),
        type_id: row.type_id.to_string(),
        term: row.term.clone(),
        case_significance_id: row.case_significance_id.to_string(),
    }
}

fn relationship_document(row: &Rf2Relationship, released: bool) -> RelationshipDocument {
    RelationshipDocument {
        id: row.id.to_string(),
        icon_id: row.type_id.to_string(),
        score: 0.0,
        active: row.active,
        effective_time: row.effective_time,
        released,
        module_id: row.module_id.to_string(),
        source_id: row.source_id.to_string(),
        destination_id: row.destination_id.map(|id| id.to_string()),
        value: row.value.clone(),
        group: row.relationship_group,
        type_id: row.type_id.to_string(),
        characteristic_type_id: row.characteristic_type_id.to_string(),
        modifier_id: row.modifier_id.to_string(),
    }
}

fn member_document(row: &Rf2RefsetMember, released: bool) -> MemberDocument {
    MemberDocument {
        id: row.id.clone(),
        icon_id: row.refset_id.to_string(),
        score: 0.0,
        active: row.active,
        effective_time: row.effective_time,
        released,
        module_id: row.module_id.to_string(),
        refset_id: row.refset_id.to_string(),
        referenced_component_id: row.referenced_component_id.to_string(),
        refset_type: row.refset_type,
        properties: row.properties.clone(),
    }
}
