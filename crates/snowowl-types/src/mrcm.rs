//! MRCM (Machine Readable Concept Model) values.

use std::fmt;

/// Error type for cardinality parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardinalityParseError {
    /// Invalid format - expected "min..max"
    InvalidFormat(String),
    /// Invalid minimum value
    InvalidMin(String),
    /// Invalid maximum value
    InvalidMax(String),
    /// Minimum is greater than maximum
    Inverted(String),
}

impl fmt::Display for CardinalityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => {
                write!(f, "invalid cardinality format: '{}' (expected min..max)", s)
            }
            Self::InvalidMin(s) => write!(f, "invalid cardinality minimum: '{}'", s),
            Self::InvalidMax(s) => write!(f, "invalid cardinality maximum: '{}'", s),
            Self::Inverted(s) => write!(f, "cardinality minimum exceeds maximum: '{}'", s),
        }
    }
}

impl std::error::Error for CardinalityParseError {}

/// Cardinality constraint of an MRCM attribute domain member.
///
/// # Examples
///
/// ```
/// use snowowl_types::Cardinality;
///
/// let card = Cardinality::parse("0..1").unwrap();
/// assert!(card.allows(1));
/// assert!(!card.allows(2));
/// assert_eq!(Cardinality::parse("1..*").unwrap().max, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cardinality {
    /// Minimum occurrences (inclusive).
    pub min: u32,
    /// Maximum occurrences (inclusive). None means unbounded (*).
    pub max: Option<u32>,
}

impl Cardinality {
    /// Parses a cardinality from a string like "0..*", "0..1", "1..1".
    pub fn parse(s: &str) -> Result<Self, CardinalityParseError> {
        let (min, max) = s
            .split_once("..")
            .ok_or_else(|| CardinalityParseError::InvalidFormat(s.to_string()))?;

        let min = min
            .parse::<u32>()
            .map_err(|_| CardinalityParseError::InvalidMin(min.to_string()))?;

        let max = if max == "*" {
            None
        } else {
            Some(
                max.parse::<u32>()
                    .map_err(|_| CardinalityParseError::InvalidMax(max.to_string()))?,
            )
        };

        if max.is_some_and(|max| max < min) {
            return Err(CardinalityParseError::Inverted(s.to_string()));
        }

        Ok(Self { min, max })
    }

    /// Returns true if the given count satisfies this cardinality constraint.
    pub fn allows(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// Returns true if an attribute range constraint restricts values to decimals.
///
/// Ranges such as `dec(>#0..)` or `dec(#0..#100)` constrain concrete values
/// of the attribute to decimal numbers.
pub fn is_decimal_range(range_constraint: &str) -> bool {
    range_constraint.trim_start().starts_with("dec(")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_parse_errors() {
        assert_eq!(
            Cardinality::parse("0-1"),
            Err(CardinalityParseError::InvalidFormat("0-1".to_string()))
        );
        assert_eq!(
            Cardinality::parse("x..1"),
            Err(CardinalityParseError::InvalidMin("x".to_string()))
        );
        assert_eq!(
            Cardinality::parse("0..y"),
            Err(CardinalityParseError::InvalidMax("y".to_string()))
        );
        assert_eq!(
            Cardinality::parse("2..1"),
            Err(CardinalityParseError::Inverted("2..1".to_string()))
        );
    }

    #[test]
    fn test_cardinality_display() {
        assert_eq!(Cardinality::parse("0..*").unwrap().to_string(), "0..*");
        assert_eq!(Cardinality::parse("1..1").unwrap().to_string(), "1..1");
    }

    #[test]
    fn test_decimal_range() {
        assert!(is_decimal_range("dec(>#0..)"));
        assert!(!is_decimal_range("int(>#0..)"));
        assert!(!is_decimal_range("<< 105590001 |Substance|"));
    }
}
