//! Reference set member rows.
//!
//! All reference set patterns share the six leading columns; the pattern
//! specific columns are kept by name in [`Rf2RefsetMember::properties`].

use crate::{RefsetType, SctId};
use std::collections::BTreeMap;

/// A row of any RF2 reference set file.
///
/// # Examples
///
/// ```
/// use snowowl_types::{RefsetType, Rf2RefsetMember};
///
/// let member = Rf2RefsetMember::new(
///     "3ad4a4b2-3e04-5d1c-9a2b-2a3a8c0d6f1e",
///     Some(20020131),
///     true,
///     900000000000207008,
///     900000000000509007,
///     754786011,
///     RefsetType::Language,
/// )
/// .with_property("acceptabilityId", "900000000000548007");
///
/// assert_eq!(member.property("acceptabilityId"), Some("900000000000548007"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rf2RefsetMember {
    /// Member UUID.
    pub id: String,
    /// Effective date in `yyyyMMdd` form, `None` for unpublished rows.
    pub effective_time: Option<u32>,
    /// Whether this member is active.
    pub active: bool,
    /// The module containing this member.
    pub module_id: SctId,
    /// The reference set concept.
    pub refset_id: SctId,
    /// The component referenced by this member.
    pub referenced_component_id: SctId,
    /// Pattern of the file the member was read from.
    pub refset_type: RefsetType,
    /// Pattern specific column values keyed by header name.
    pub properties: BTreeMap<String, String>,
}

impl Rf2RefsetMember {
    /// Creates a member without pattern specific properties.
    pub fn new(
        id: impl Into<String>,
        effective_time: Option<u32>,
        active: bool,
        module_id: SctId,
        refset_id: SctId,
        referenced_component_id: SctId,
        refset_type: RefsetType,
    ) -> Self {
        Self {
            id: id.into(),
            effective_time,
            active,
            module_id,
            refset_id,
            referenced_component_id,
            refset_type,
            properties: BTreeMap::new(),
        }
    }

    /// Adds a pattern specific property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns a pattern specific property by header name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Returns a property parsed as an SCTID.
    pub fn property_id(&self, name: &str) -> Option<SctId> {
        self.property(name).and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_id() {
        let member = Rf2RefsetMember::new(
            "a8b4ad0c-6d1e-4c36-9f3f-3a0c8f2f4c11",
            None,
            true,
            900000000000207008,
            723562003,
            1142135004,
            RefsetType::MrcmAttributeRange,
        )
        .with_property("rangeConstraint", "dec(>#0..)")
        .with_property("ruleStrengthId", "723597001");

        assert_eq!(member.property_id("ruleStrengthId"), Some(723597001));
        assert_eq!(member.property_id("rangeConstraint"), None);
        assert_eq!(member.property("missing"), None);
    }
}
