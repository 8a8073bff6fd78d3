//! Relationship rows, including concrete value relationships.

use crate::SctId;
use std::fmt;

/// A concrete (literal) relationship value.
///
/// In release files strings are quoted and numbers are prefixed with `#`.
///
/// # Examples
///
/// ```
/// use snowowl_types::ConcreteValue;
///
/// assert_eq!(ConcreteValue::parse("#500"), Some(ConcreteValue::Integer(500)));
/// assert_eq!(ConcreteValue::parse("#0.5"), Some(ConcreteValue::Decimal(0.5)));
/// assert_eq!(ConcreteValue::parse("\"tablet\""), Some(ConcreteValue::String("tablet".into())));
/// assert_eq!(ConcreteValue::parse("500"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcreteValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A decimal value.
    Decimal(f64),
}

impl ConcreteValue {
    /// Parses a concrete value from its release file form.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return Some(ConcreteValue::String(s[1..s.len() - 1].to_string()));
        }

        let number = s.strip_prefix('#')?;
        if number.contains('.') {
            number.parse::<f64>().ok().map(ConcreteValue::Decimal)
        } else {
            number.parse::<i64>().ok().map(ConcreteValue::Integer)
        }
    }

    /// Returns the value as an integer if it is an Integer variant.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConcreteValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Converts an integer value into the equivalent decimal value.
    ///
    /// Other variants are returned unchanged.
    pub fn to_decimal(&self) -> ConcreteValue {
        match self {
            ConcreteValue::Integer(i) => ConcreteValue::Decimal(*i as f64),
            other => other.clone(),
        }
    }
}

impl fmt::Display for ConcreteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteValue::String(s) => write!(f, "\"{}\"", s),
            ConcreteValue::Integer(i) => write!(f, "#{}", i),
            ConcreteValue::Decimal(d) => write!(f, "#{}", d),
        }
    }
}

/// A row of an RF2 relationship or concrete value relationship file.
///
/// Exactly one of `destination_id` and `value` is set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rf2Relationship {
    /// Unique identifier for this relationship.
    pub id: SctId,
    /// Effective date in `yyyyMMdd` form, `None` for unpublished rows.
    pub effective_time: Option<u32>,
    /// Whether this relationship is active.
    pub active: bool,
    /// The module containing this relationship.
    pub module_id: SctId,
    /// The source concept.
    pub source_id: SctId,
    /// The destination concept of a concept-valued relationship.
    pub destination_id: Option<SctId>,
    /// The literal value of a concrete value relationship.
    pub value: Option<ConcreteValue>,
    /// Role group number, 0 when ungrouped.
    pub relationship_group: u32,
    /// The attribute concept.
    pub type_id: SctId,
    /// Stated, inferred or additional.
    pub characteristic_type_id: SctId,
    /// Existential or universal.
    pub modifier_id: SctId,
}

impl Rf2Relationship {
    /// Returns true if this is a concrete value relationship.
    pub fn is_concrete(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_value_display() {
        assert_eq!(ConcreteValue::Integer(500).to_string(), "#500");
        assert_eq!(ConcreteValue::Decimal(0.5).to_string(), "#0.5");
        assert_eq!(ConcreteValue::String("tablet".into()).to_string(), "\"tablet\"");
    }

    #[test]
    fn test_integer_to_decimal() {
        assert_eq!(ConcreteValue::Integer(2).to_decimal(), ConcreteValue::Decimal(2.0));
        assert_eq!(
            ConcreteValue::String("x".into()).to_decimal(),
            ConcreteValue::String("x".into())
        );
        assert_eq!(ConcreteValue::parse("#abc"), None);
    }
}
