//! SNOMED CT identifiers (SCTIDs).
//!
//! An SCTID is a 6 to 18 digit number. The last digit is a check digit and
//! the two digits before it form the partition identifier, which tells which
//! kind of component the identifier belongs to.

use std::fmt;

/// A SNOMED CT identifier (SCTID).
///
/// # Examples
///
/// ```
/// use snowowl_types::SctId;
///
/// let concept_id: SctId = 73211009; // Diabetes mellitus
/// ```
pub type SctId = u64;

/// Reserved container id for rows that belong to no concept.
///
/// Reference set members of the metadata hierarchy and unrelated rows are
/// registered against this container; it never resolves to a component.
pub const ROOT_CONTAINER: &str = "ROOT";

/// Kind of component an SCTID identifies, derived from its partition digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentCategory {
    /// Concept identifier (partition `00` or `10`).
    Concept,
    /// Description identifier (partition `01` or `11`).
    Description,
    /// Relationship identifier (partition `02` or `12`).
    Relationship,
}

impl ComponentCategory {
    /// Lowercase name used in error messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Description => "description",
            Self::Relationship => "relationship",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string is not a well-formed SCTID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SctIdError {
    /// The value is empty.
    Empty,
    /// The value contains something other than ASCII digits.
    NotNumeric(String),
    /// The value has fewer than 6 or more than 18 digits.
    InvalidLength(String),
    /// The value starts with a zero.
    LeadingZero(String),
    /// The partition identifier is not one of the known partitions.
    UnknownPartition(String),
    /// The identifier is valid but belongs to a different category.
    WrongCategory {
        /// The offending identifier.
        id: String,
        /// The category the caller expected.
        expected: ComponentCategory,
        /// The category encoded in the identifier.
        actual: ComponentCategory,
    },
}

impl fmt::Display for SctIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "SCTID is empty"),
            Self::NotNumeric(id) => write!(f, "SCTID '{}' is not numeric", id),
            Self::InvalidLength(id) => {
                write!(f, "SCTID '{}' must be between 6 and 18 digits long", id)
            }
            Self::LeadingZero(id) => write!(f, "SCTID '{}' starts with zero", id),
            Self::UnknownPartition(id) => {
                write!(f, "SCTID '{}' has an unknown partition identifier", id)
            }
            Self::WrongCategory {
                id,
                expected,
                actual,
            } => write!(
                f,
                "SCTID '{}' identifies a {} but a {} was expected",
                id, actual, expected
            ),
        }
    }
}

impl std::error::Error for SctIdError {}

/// Validates an SCTID string and returns its numeric value and category.
///
/// # Examples
///
/// ```
/// use snowowl_types::{validate_sctid, ComponentCategory};
///
/// let (id, category) = validate_sctid("73211009").unwrap();
/// assert_eq!(id, 73211009);
/// assert_eq!(category, ComponentCategory::Concept);
/// assert!(validate_sctid("007").is_err());
/// ```
pub fn validate_sctid(value: &str) -> Result<(SctId, ComponentCategory), SctIdError> {
    if value.is_empty() {
        return Err(SctIdError::Empty);
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SctIdError::NotNumeric(value.to_string()));
    }
    if value.len() < 6 || value.len() > 18 {
        return Err(SctIdError::InvalidLength(value.to_string()));
    }
    if value.starts_with('0') {
        return Err(SctIdError::LeadingZero(value.to_string()));
    }

    let id = value
        .parse::<SctId>()
        .map_err(|_| SctIdError::NotNumeric(value.to_string()))?;
    let category = category_of(id).ok_or_else(|| SctIdError::UnknownPartition(value.to_string()))?;
    Ok((id, category))
}

/// Validates an SCTID string and checks that it belongs to `expected`.
pub fn validate_sctid_of(value: &str, expected: ComponentCategory) -> Result<SctId, SctIdError> {
    let (id, actual) = validate_sctid(value)?;
    if actual != expected {
        return Err(SctIdError::WrongCategory {
            id: value.to_string(),
            expected,
            actual,
        });
    }
    Ok(id)
}

/// Returns the category encoded in the partition digits of `id`.
///
/// The first partition digit selects short (`0`) or namespaced (`1`) format,
/// the second one the component kind.
pub fn category_of(id: SctId) -> Option<ComponentCategory> {
    let partition = (id / 10) % 100;
    match partition {
        0 | 10 => Some(ComponentCategory::Concept),
        1 | 11 => Some(ComponentCategory::Description),
        2 | 12 => Some(ComponentCategory::Relationship),
        _ => None,
    }
}
