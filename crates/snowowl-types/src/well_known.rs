//! Well-known SNOMED CT concept ids used by the importer.

use crate::SctId;

/// SNOMED CT root concept.
pub const SNOMED_CT_ROOT: SctId = 138875005;

/// Is a (attribute).
pub const IS_A: SctId = 116680003;

/// SNOMED CT core module.
pub const SNOMED_CT_CORE_MODULE: SctId = 900000000000207008;

/// SNOMED CT model component module.
pub const MODEL_COMPONENT_MODULE: SctId = 900000000000012004;

/// US English language reference set.
pub const US_ENGLISH_LANGUAGE_REFSET: SctId = 900000000000509007;

/// GB English language reference set.
pub const GB_ENGLISH_LANGUAGE_REFSET: SctId = 900000000000508004;

/// MRCM attribute range international reference set.
pub const MRCM_ATTRIBUTE_RANGE_INTERNATIONAL: SctId = 723562003;

/// Mandatory concept model rule strength.
pub const MANDATORY_CONCEPT_MODEL_RULE: SctId = 723597001;

/// Existential restriction modifier.
pub const EXISTENTIAL_RESTRICTION_MODIFIER: SctId = 900000000000451002;
