//! # snowowl-types
//!
//! RF2 row types, identifiers and coded values shared by the Snow Owl
//! repository and import crates.
//!
//! ## Features
//!
//! - `serde` (default): serialization support for every row type. The
//!   RF2 slice store relies on it to spill rows to disk.

#![warn(missing_docs)]

mod component;
mod concept;
mod description;
mod effective_time;
mod enums;
pub mod mrcm;
mod refset;
mod relationship;
mod sctid;
pub mod well_known;

pub use component::Rf2Component;
pub use concept::Rf2Concept;
pub use description::Rf2Description;
pub use effective_time::{format_iso_date, parse_effective_time, EffectiveTimeError};
pub use enums::{
    Acceptability, CaseSignificance, CharacteristicType, DefinitionStatus, DescriptionType,
    RefsetType, ReleaseType, UnknownReleaseType,
};
pub use mrcm::{Cardinality, CardinalityParseError};
pub use refset::Rf2RefsetMember;
pub use relationship::{ConcreteValue, Rf2Relationship};
pub use sctid::{
    category_of, validate_sctid, validate_sctid_of, ComponentCategory, SctId, SctIdError,
    ROOT_CONTAINER,
};
