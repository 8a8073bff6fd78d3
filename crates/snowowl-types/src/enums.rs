//! Coded values used by RF2 rows and import requests.

use crate::SctId;
use std::fmt;
use std::str::FromStr;

/// Definition status of a concept.
///
/// # Examples
///
/// ```
/// use snowowl_types::DefinitionStatus;
///
/// let status = DefinitionStatus::from_id(900000000000074008);
/// assert_eq!(status, Some(DefinitionStatus::Primitive));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionStatus {
    /// Necessary conditions only.
    Primitive,
    /// Necessary and sufficient conditions.
    FullyDefined,
}

impl DefinitionStatus {
    /// SCTID for primitive definition status.
    pub const PRIMITIVE_ID: SctId = 900000000000074008;
    /// SCTID for fully defined definition status.
    pub const FULLY_DEFINED_ID: SctId = 900000000000073002;

    /// Creates a DefinitionStatus from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PRIMITIVE_ID => Some(Self::Primitive),
            Self::FULLY_DEFINED_ID => Some(Self::FullyDefined),
            _ => None,
        }
    }

    /// Returns the SCTID for this definition status.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Primitive => Self::PRIMITIVE_ID,
            Self::FullyDefined => Self::FULLY_DEFINED_ID,
        }
    }
}

/// Description type (FSN, synonym or text definition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptionType {
    /// Fully Specified Name.
    Fsn,
    /// Synonym.
    Synonym,
    /// Text definition.
    Definition,
}

impl DescriptionType {
    /// SCTID for Fully Specified Name type.
    pub const FSN_ID: SctId = 900000000000003001;
    /// SCTID for Synonym type.
    pub const SYNONYM_ID: SctId = 900000000000013009;
    /// SCTID for Definition type.
    pub const DEFINITION_ID: SctId = 900000000000550004;

    /// Creates a DescriptionType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::FSN_ID => Some(Self::Fsn),
            Self::SYNONYM_ID => Some(Self::Synonym),
            Self::DEFINITION_ID => Some(Self::Definition),
            _ => None,
        }
    }

    /// Returns the SCTID for this description type.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Fsn => Self::FSN_ID,
            Self::Synonym => Self::SYNONYM_ID,
            Self::Definition => Self::DEFINITION_ID,
        }
    }
}

/// Case significance of a description term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseSignificance {
    /// Entire term is case insensitive.
    CaseInsensitive,
    /// Entire term is case sensitive.
    EntireTermCaseSensitive,
    /// Only initial character is case sensitive.
    InitialCharacterCaseSensitive,
}

impl CaseSignificance {
    /// SCTID for case insensitive.
    pub const CASE_INSENSITIVE_ID: SctId = 900000000000448009;
    /// SCTID for entire term case sensitive.
    pub const ENTIRE_TERM_CASE_SENSITIVE_ID: SctId = 900000000000017005;
    /// SCTID for initial character case sensitive.
    pub const INITIAL_CHAR_CASE_SENSITIVE_ID: SctId = 900000000000020002;

    /// Creates a CaseSignificance from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::CASE_INSENSITIVE_ID => Some(Self::CaseInsensitive),
            Self::ENTIRE_TERM_CASE_SENSITIVE_ID => Some(Self::EntireTermCaseSensitive),
            Self::INITIAL_CHAR_CASE_SENSITIVE_ID => Some(Self::InitialCharacterCaseSensitive),
            _ => None,
        }
    }
}

/// Characteristic type of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacteristicType {
    /// Stated relationship (as authored).
    Stated,
    /// Inferred relationship (computed by classifier).
    Inferred,
    /// Additional relationship.
    Additional,
}

impl CharacteristicType {
    /// SCTID for stated relationship.
    pub const STATED_ID: SctId = 900000000000010007;
    /// SCTID for inferred relationship.
    pub const INFERRED_ID: SctId = 900000000000011006;
    /// SCTID for additional relationship.
    pub const ADDITIONAL_ID: SctId = 900000000000227009;

    /// Creates a CharacteristicType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::STATED_ID => Some(Self::Stated),
            Self::INFERRED_ID => Some(Self::Inferred),
            Self::ADDITIONAL_ID => Some(Self::Additional),
            _ => None,
        }
    }
}

/// Acceptability of a description in a language reference set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceptability {
    /// Preferred term in the dialect.
    Preferred,
    /// Acceptable term in the dialect.
    Acceptable,
}

impl Acceptability {
    /// SCTID for preferred acceptability.
    pub const PREFERRED_ID: SctId = 900000000000548007;
    /// SCTID for acceptable acceptability.
    pub const ACCEPTABLE_ID: SctId = 900000000000549004;

    /// Creates an Acceptability from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PREFERRED_ID => Some(Self::Preferred),
            Self::ACCEPTABLE_ID => Some(Self::Acceptable),
            _ => None,
        }
    }
}

/// Reference set patterns recognised by the importer.
///
/// Each pattern is identified by the additional columns that follow the
/// six common member columns in the release file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefsetType {
    /// Simple type reference set (no additional columns).
    Simple,
    /// Language reference set.
    Language,
    /// Association reference set.
    Association,
    /// Attribute value reference set.
    AttributeValue,
    /// Simple map reference set.
    SimpleMap,
    /// Simple map with a map target description.
    SimpleMapWithDescription,
    /// Complex map reference set.
    ComplexMap,
    /// Extended map reference set.
    ExtendedMap,
    /// Description format reference set.
    DescriptionType,
    /// Module dependency reference set.
    ModuleDependency,
    /// OWL axiom and ontology reference sets.
    OwlExpression,
    /// MRCM domain reference set.
    MrcmDomain,
    /// MRCM attribute domain reference set.
    MrcmAttributeDomain,
    /// MRCM attribute range reference set.
    MrcmAttributeRange,
    /// MRCM module scope reference set.
    MrcmModuleScope,
}

impl RefsetType {
    /// All supported reference set types.
    pub const ALL: [RefsetType; 15] = [
        Self::Simple,
        Self::Language,
        Self::Association,
        Self::AttributeValue,
        Self::SimpleMap,
        Self::SimpleMapWithDescription,
        Self::ComplexMap,
        Self::ExtendedMap,
        Self::DescriptionType,
        Self::ModuleDependency,
        Self::OwlExpression,
        Self::MrcmDomain,
        Self::MrcmAttributeDomain,
        Self::MrcmAttributeRange,
        Self::MrcmModuleScope,
    ];

    /// Header columns following `referencedComponentId`.
    pub fn additional_fields(self) -> &'static [&'static str] {
        match self {
            Self::Simple => &[],
            Self::Language => &["acceptabilityId"],
            Self::Association => &["targetComponentId"],
            Self::AttributeValue => &["valueId"],
            Self::SimpleMap => &["mapTarget"],
            Self::SimpleMapWithDescription => &["mapTarget", "mapTargetDescription"],
            Self::ComplexMap => &[
                "mapGroup",
                "mapPriority",
                "mapRule",
                "mapAdvice",
                "mapTarget",
                "correlationId",
            ],
            Self::ExtendedMap => &[
                "mapGroup",
                "mapPriority",
                "mapRule",
                "mapAdvice",
                "mapTarget",
                "correlationId",
                "mapCategoryId",
            ],
            Self::DescriptionType => &["descriptionFormat", "descriptionLength"],
            Self::ModuleDependency => &["sourceEffectiveTime", "targetEffectiveTime"],
            Self::OwlExpression => &["owlExpression"],
            Self::MrcmDomain => &[
                "domainConstraint",
                "parentDomain",
                "proximalPrimitiveConstraint",
                "proximalPrimitiveRefinement",
                "domainTemplateForPrecoordination",
                "domainTemplateForPostcoordination",
                "guideURL",
            ],
            Self::MrcmAttributeDomain => &[
                "domainId",
                "grouped",
                "attributeCardinality",
                "attributeInGroupCardinality",
                "ruleStrengthId",
                "contentTypeId",
            ],
            Self::MrcmAttributeRange => &[
                "rangeConstraint",
                "attributeRule",
                "ruleStrengthId",
                "contentTypeId",
            ],
            Self::MrcmModuleScope => &["mrcmRuleRefsetId"],
        }
    }

    /// Additional fields whose values must be concept identifiers.
    pub fn concept_fields(self) -> &'static [&'static str] {
        match self {
            Self::Language => &["acceptabilityId"],
            Self::AttributeValue => &["valueId"],
            Self::ComplexMap => &["correlationId"],
            Self::ExtendedMap => &["correlationId", "mapCategoryId"],
            Self::DescriptionType => &["descriptionFormat"],
            Self::MrcmAttributeDomain => &["domainId", "ruleStrengthId", "contentTypeId"],
            Self::MrcmAttributeRange => &["ruleStrengthId", "contentTypeId"],
            Self::MrcmModuleScope => &["mrcmRuleRefsetId"],
            _ => &[],
        }
    }

    /// Short name used in file names and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Language => "language",
            Self::Association => "association",
            Self::AttributeValue => "attribute-value",
            Self::SimpleMap => "simple-map",
            Self::SimpleMapWithDescription => "simple-map-with-description",
            Self::ComplexMap => "complex-map",
            Self::ExtendedMap => "extended-map",
            Self::DescriptionType => "description-type",
            Self::ModuleDependency => "module-dependency",
            Self::OwlExpression => "owl-expression",
            Self::MrcmDomain => "mrcm-domain",
            Self::MrcmAttributeDomain => "mrcm-attribute-domain",
            Self::MrcmAttributeRange => "mrcm-attribute-range",
            Self::MrcmModuleScope => "mrcm-module-scope",
        }
    }
}

impl fmt::Display for RefsetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RF2 release type of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum ReleaseType {
    /// Every historical state of every component.
    Full,
    /// Latest state of every component.
    #[default]
    Snapshot,
    /// Changes since the previous release.
    Delta,
}

impl ReleaseType {
    /// File name fragment identifying this release type (`Full`, `Snapshot`, `Delta`).
    pub fn file_marker(self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Snapshot => "Snapshot",
            Self::Delta => "Delta",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_marker().to_uppercase())
    }
}

/// Error returned when a release type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReleaseType(pub String);

impl fmt::Display for UnknownReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown release type '{}'", self.0)
    }
}

impl std::error::Error for UnknownReleaseType {}

impl FromStr for ReleaseType {
    type Err = UnknownReleaseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "snapshot" => Ok(Self::Snapshot),
            "delta" => Ok(Self::Delta),
            _ => Err(UnknownReleaseType(s.to_string())),
        }
    }
}
