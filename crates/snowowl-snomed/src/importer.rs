//! RF2 import orchestration.
//!
//! An import reads the whole archive into effective time slices, checks
//! every row on its own, then checks the references of the archive as a
//! whole. Only an archive without errors is written: slice by slice in
//! effective time order, and batch by batch in dependency order within each
//! slice. Every batch is one commit.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use snowowl_core::{AttachmentRegistry, CodeSystem, CodeSystemRegistry, Repository, SnowowlError};
use snowowl_index::{ObjectId, Query, RevisionSearcher};
use snowowl_types::{mrcm, ConcreteValue, RefsetType, ReleaseType, Rf2Component};
use uuid::Uuid;

use crate::availability::{ContentAvailabilityInfoProvider, IndexContentAvailability};
use crate::defects::{DefectReporter, ImportDefect};
use crate::documents::{SnomedDocument, CONCEPT, IMPORT_ORDER, MEMBER, REFSET, RELATIONSHIP};
use crate::locales::update_locales;
use crate::parser::read_archive;
use crate::slice::{EffectiveTimeSlice, EffectiveTimeSlices, SliceKey, SliceStore};
use crate::transaction::Rf2TransactionContext;
use crate::types::{Rf2ImportConfig, Rf2Result};
use crate::validation::ReferenceValidator;

const DECIMAL_CONVERSION_COMMENT: &str = "Update value types using MRCM range constraints";

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    /// The archive was valid and, unless it was a dry run, written.
    Completed,
    /// The archive has errors; nothing was written.
    Failed,
}

/// What an import did.
#[derive(Debug, Clone, Serialize)]
pub struct Rf2ImportResponse {
    /// Outcome.
    pub status: ImportStatus,
    /// Errors and warnings found in the archive.
    pub defects: Vec<ImportDefect>,
    /// Concepts and reference sets touched by the import.
    pub visited_components: BTreeSet<ObjectId>,
    /// Slices written, in import order.
    pub imported_slices: Vec<String>,
}

impl Rf2ImportResponse {
    fn new(status: ImportStatus, defects: Vec<ImportDefect>) -> Self {
        Self {
            status,
            defects,
            visited_components: BTreeSet::new(),
            imported_slices: Vec::new(),
        }
    }

    /// Returns true if the import completed.
    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Completed
    }
}

/// Imports RF2 archives into a SNOMED CT repository.
pub struct Rf2Importer {
    repository: Arc<Repository<SnomedDocument>>,
    code_systems: Arc<CodeSystemRegistry>,
    availability: Arc<dyn ContentAvailabilityInfoProvider>,
}

impl Rf2Importer {
    /// Creates an importer. Delta imports require a concept on the branch
    /// unless another availability provider is set.
    pub fn new(
        repository: Arc<Repository<SnomedDocument>>,
        code_systems: Arc<CodeSystemRegistry>,
    ) -> Self {
        let availability = Arc::new(IndexContentAvailability::new(repository.clone()));
        Self {
            repository,
            code_systems,
            availability,
        }
    }

    /// Replaces the content availability check.
    pub fn with_availability(mut self, availability: Arc<dyn ContentAvailabilityInfoProvider>) -> Self {
        self.availability = availability;
        self
    }

    /// Imports an uploaded archive.
    pub fn import_attachment(
        &self,
        attachments: &dyn AttachmentRegistry,
        attachment_id: Uuid,
        branch: &str,
        config: &Rf2ImportConfig,
    ) -> Rf2Result<Rf2ImportResponse> {
        let archive = attachments.get(attachment_id)?;
        self.import(branch, &archive, config)
    }

    /// Imports the archive at `archive` onto `branch`.
    ///
    /// Request level problems (unknown branch, delta without content, bad
    /// versioning setup) are returned as errors before the archive is read.
    /// Problems inside the archive are reported in the response.
    pub fn import(
        &self,
        branch: &str,
        archive: &Path,
        config: &Rf2ImportConfig,
    ) -> Rf2Result<Rf2ImportResponse> {
        self.repository.branch(branch)?;

        if config.release_type == ReleaseType::Delta && !self.availability.is_available(branch)? {
            return Err(SnowowlError::bad_request(format!(
                "Importing a delta release onto branch '{}' requires existing content; import a full or snapshot release first",
                branch
            ))
            .into());
        }
        let version_target = if config.create_versions {
            Some(self.check_versioning(branch)?)
        } else {
            None
        };

        tracing::info!(
            branch = %branch,
            archive = %archive.display(),
            release_type = %config.release_type,
            dry_run = config.dry_run,
            "Starting RF2 import"
        );

        let mut defects = DefectReporter::new();
        let mut slices = EffectiveTimeSlices::new(config.release_type, config.flush_threshold)?;
        let mut validator = ReferenceValidator::new(&config.ignore_missing_references_in);
        read_archive(archive, config.release_type, &mut defects, |file, line, component| {
            validator.collect(file, line, &component);
            slices.register(&component)
        })?;
        slices.flush()?;

        if defects.has_errors() {
            tracing::warn!(errors = defects.error_count(), "RF2 archive has invalid rows, nothing imported");
            return Ok(Rf2ImportResponse::new(ImportStatus::Failed, defects.into_defects()));
        }

        let searcher = self.repository.index().read(branch)?;
        validator.validate(&searcher, &mut defects)?;
        if defects.has_errors() {
            tracing::warn!(errors = defects.error_count(), "RF2 archive has missing references, nothing imported");
            return Ok(Rf2ImportResponse::new(ImportStatus::Failed, defects.into_defects()));
        }

        let keys: Vec<SliceKey> = slices
            .keys()
            .into_iter()
            .filter(|key| match (config.import_until, key.effective_time()) {
                (Some(until), Some(effective_time)) => effective_time <= until,
                _ => true,
            })
            .collect();
        if let Some(code_system) = &version_target {
            check_version_order(code_system, &keys)?;
        }

        if config.dry_run {
            tracing::info!(slices = slices.len(), "Dry run finished, nothing imported");
            return Ok(Rf2ImportResponse::new(ImportStatus::Completed, defects.into_defects()));
        }

        let mut response = Rf2ImportResponse::new(ImportStatus::Completed, Vec::new());
        if let Some(until) = config.import_until {
            for key in slices.keys().into_iter().filter(|key| !keys.contains(key)) {
                tracing::info!(slice = %key, "Skipping slice after {}", until);
            }
        }
        for key in keys {
            let Some(slice) = slices.take(key) else {
                continue;
            };
            self.import_slice(branch, slice, slices.store(), config, &mut response)?;

            if let (Some(code_system), SliceKey::Published(effective_time)) = (&version_target, key) {
                self.code_systems.create_version(
                    self.repository.index(),
                    &code_system.short_name,
                    effective_time,
                    &format!("RF2 release {}", key),
                )?;
            }
            slices.store().remove(key)?;
            response.imported_slices.push(key.to_string());
        }

        if let Some(code_system) = self.code_systems.find_by_branch(branch)? {
            update_locales(
                &self.code_systems,
                &code_system.short_name,
                &self.repository.index().read(branch)?,
            )?;
        }

        response.defects = defects.into_defects();
        Ok(response)
    }

    fn check_versioning(&self, branch: &str) -> Rf2Result<CodeSystem> {
        let code_system = self.code_systems.find_by_branch(branch)?.ok_or_else(|| {
            SnowowlError::bad_request(format!("No code system is stored on branch '{}'", branch))
        })?;
        if code_system.branch_path != branch {
            return Err(SnowowlError::bad_request(format!(
                "Versions of '{}' can only be created on its working branch '{}'",
                code_system.short_name, code_system.branch_path
            ))
            .into());
        }

        let searcher = self.repository.index().read(branch)?;
        for kind in IMPORT_ORDER {
            let unpublished = Query::select(kind)
                .filter(|doc: &SnomedDocument| doc.effective_time().is_none())
                .limit(1);
            if searcher.search(&unpublished)?.total > 0 {
                return Err(SnowowlError::bad_request(format!(
                    "Branch '{}' has unpublished {} components; publish or remove them before creating a version",
                    branch, kind
                ))
                .into());
            }
        }
        Ok(code_system)
    }

    fn import_slice(
        &self,
        branch: &str,
        mut slice: EffectiveTimeSlice,
        store: &SliceStore,
        config: &Rf2ImportConfig,
        response: &mut Rf2ImportResponse,
    ) -> Rf2Result<()> {
        let started = Instant::now();
        let key = slice.key();
        let comment = match key {
            SliceKey::Unpublished => {
                tracing::info!("Importing unpublished components");
                "Imported unpublished components".to_string()
            }
            _ => {
                tracing::info!("Importing components from {}", key);
                format!("Imported components from {}", key)
            }
        };

        let mut tx = Rf2TransactionContext::new(self.repository.open_transaction(branch, &config.author)?);
        // relationship id -> attribute type id
        let mut integer_values: BTreeMap<String, String> = BTreeMap::new();
        let mut skipped = 0;
        let mut commits = 0;

        for batch in slice.import_plan(config.batch_size) {
            let mut components = Vec::with_capacity(batch.len());
            for id in batch {
                match slice.component(store, &id.to_string())? {
                    Some(component) => components.push(component),
                    None => skipped += 1,
                }
                for member_id in slice.take_members(id) {
                    match slice.component(store, &member_id)? {
                        Some(component) => components.push(component),
                        None => skipped += 1,
                    }
                }
            }
            if components.is_empty() {
                continue;
            }

            for component in &components {
                visit(component, response, &mut integer_values);
            }
            tx.add(components)?;
            if tx.commit(&config.author, &comment)?.is_some() {
                commits += 1;
            }
        }

        if skipped > 0 {
            tracing::debug!(slice = %key, skipped, "Ids not part of the slice were skipped");
        }

        if !integer_values.is_empty() {
            self.convert_decimal_values(branch, config, &integer_values)?;
        }

        tracing::info!(commits, "{} in {:?}", comment, started.elapsed());
        Ok(())
    }

    fn convert_decimal_values(
        &self,
        branch: &str,
        config: &Rf2ImportConfig,
        integer_values: &BTreeMap<String, String>,
    ) -> Rf2Result<()> {
        let searcher = self.repository.index().read(branch)?;
        let decimal_types = decimal_attribute_types(&searcher)?;
        let candidates: Vec<&str> = integer_values
            .iter()
            .filter(|(_, type_id)| decimal_types.contains(*type_id))
            .map(|(id, _)| id.as_str())
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let mut tx = self.repository.open_transaction(branch, &config.author)?;
        let mut converted = 0;
        for doc in tx.lookup_if_exists(RELATIONSHIP, candidates.as_slice())? {
            let Some(relationship) = doc.as_relationship() else {
                continue;
            };
            let Some(value @ ConcreteValue::Integer(_)) = &relationship.value else {
                continue;
            };
            let mut updated = relationship.clone();
            updated.value = Some(value.to_decimal());
            tx.update(doc, SnomedDocument::Relationship(updated))?;
            converted += 1;
        }
        tx.commit(&config.author, DECIMAL_CONVERSION_COMMENT, None)?;
        tracing::info!(branch = %branch, converted, "Converted integer values to decimals");
        Ok(())
    }
}

/// Every published slice about to be versioned must be newer than the latest
/// version of the code system; checked before anything is written.
fn check_version_order(code_system: &CodeSystem, keys: &[SliceKey]) -> Rf2Result<()> {
    let Some(latest) = code_system.versions.last() else {
        return Ok(());
    };
    let stale = keys.iter().find_map(|key| match key {
        SliceKey::Published(effective_time) if *effective_time <= latest.effective_time => {
            Some(*effective_time)
        }
        _ => None,
    });
    match stale {
        Some(effective_time) => Err(SnowowlError::bad_request(format!(
            "Release {} of '{}' is not after the latest version '{}'",
            effective_time, code_system.short_name, latest.version_id
        ))
        .into()),
        None => Ok(()),
    }
}

/// Attribute types whose concrete values the MRCM constrains to decimals.
fn decimal_attribute_types(searcher: &RevisionSearcher<SnomedDocument>) -> Rf2Result<BTreeSet<String>> {
    let query = Query::select(MEMBER).filter(|doc: &SnomedDocument| {
        doc.as_member().map_or(false, |member| {
            member.active
                && member.refset_type == RefsetType::MrcmAttributeRange
                && member
                    .properties
                    .get("rangeConstraint")
                    .map_or(false, |range| mrcm::is_decimal_range(range))
        })
    });
    Ok(searcher
        .search(&query)?
        .items
        .iter()
        .filter_map(|doc| doc.as_member().map(|member| member.referenced_component_id.clone()))
        .collect())
}

fn visit(
    component: &Rf2Component,
    response: &mut Rf2ImportResponse,
    integer_values: &mut BTreeMap<String, String>,
) {
    let visited = match component {
        Rf2Component::Concept(concept) => ObjectId::new(CONCEPT, concept.id.to_string()),
        Rf2Component::Description(description) => {
            ObjectId::new(CONCEPT, description.concept_id.to_string())
        }
        Rf2Component::Relationship(relationship) => {
            if let Some(ConcreteValue::Integer(_)) = relationship.value {
                integer_values.insert(relationship.id.to_string(), relationship.type_id.to_string());
            }
            ObjectId::new(CONCEPT, relationship.source_id.to_string())
        }
        Rf2Component::Member(member) => ObjectId::new(REFSET, member.refset_id.to_string()),
    };
    response.visited_components.insert(visited);
}
