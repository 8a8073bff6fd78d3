//! # snowowl-snomed
//!
//! SNOMED CT on top of the Snow Owl repository layer: the revision
//! documents of concepts, descriptions, relationships and reference set
//! members, and the RF2 import pipeline.
//!
//! ## Import pipeline
//!
//! 1. [`read_archive`] parses every release file of a zip archive and checks
//!    each row on its own.
//! 2. Rows are filed into [`EffectiveTimeSlices`], spilled to a temporary
//!    SQLite store, together with the dependencies between components.
//! 3. [`ReferenceValidator`] checks that every referenced component is either
//!    in the archive or already on the target branch.
//! 4. [`Rf2Importer`] replays the slices in effective time order; within a
//!    slice the [`import_plan`] batches components so that everything a batch
//!    refers to was committed before it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use snowowl_core::{CodeSystem, CodeSystemRegistry};
//! use snowowl_snomed::{snomed_repository, Rf2ImportConfig, Rf2Importer};
//!
//! let repository = Arc::new(snomed_repository("snomedStore"));
//! let code_systems = Arc::new(CodeSystemRegistry::new());
//! code_systems.register(CodeSystem::new("SNOMEDCT", "snomedStore", "MAIN"))?;
//!
//! let importer = Rf2Importer::new(repository, code_systems);
//! let response = importer.import("MAIN", Path::new("release.zip"), &Rf2ImportConfig::default())?;
//! println!("{:?}", response.status);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod availability;
mod defects;
mod documents;
mod importer;
mod locales;
pub mod parser;
pub mod planner;
mod slice;
mod transaction;
mod types;
mod validation;

pub use availability::{ContentAvailabilityInfoProvider, IndexContentAvailability};
pub use defects::{DefectReporter, DefectSeverity, ImportDefect};
pub use documents::{
    kind_of, kind_of_id, snomed_mappings, snomed_repository, ConceptDocument, DescriptionDocument,
    MemberDocument, RelationshipDocument, ReleasedComponentDeletionPolicy, SnomedDocument, CONCEPT,
    DESCRIPTION, IMPORT_ORDER, MEMBER, REFSET, RELATIONSHIP, UNSPECIFIED_COMPONENT_TYPE,
};
pub use importer::{ImportStatus, Rf2ImportResponse, Rf2Importer};
pub use locales::{language_settings, update_locales};
pub use parser::{read_archive, ReadStats, Rf2ContentType};
pub use planner::import_plan;
pub use slice::{EffectiveTimeSlice, EffectiveTimeSlices, SliceKey, SliceStore};
pub use transaction::{Rf2TransactionContext, IMPORT_LOCK_DESCRIPTION};
pub use types::{Rf2Error, Rf2ImportConfig, Rf2Result};
pub use validation::ReferenceValidator;

// Re-export the row types for convenience
pub use snowowl_types;
