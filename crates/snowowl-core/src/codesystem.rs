//! Code systems, their settings and versions.

use crate::transaction::map_index_error;
use crate::{Result, SnowowlError};
use serde::Serialize;
use snowowl_index::{IndexError, Revision, RevisionIndex};
use snowowl_types::format_iso_date;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Language settings of a code system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeSystemSettings {
    /// Locales, e.g. `en-us` or `en-x-900000000000509007`.
    pub locales: BTreeSet<String>,
    /// Language tag to the language reference sets used for it.
    pub languages: BTreeMap<String, BTreeSet<String>>,
}

impl CodeSystemSettings {
    /// Adds every locale and language reference set of `other`.
    ///
    /// Nothing already configured is ever removed.
    pub fn merge(&mut self, other: &CodeSystemSettings) {
        self.locales.extend(other.locales.iter().cloned());
        for (language, refsets) in &other.languages {
            self.languages
                .entry(language.clone())
                .or_default()
                .extend(refsets.iter().cloned());
        }
    }
}

/// A released version of a code system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSystemVersion {
    /// Version id, the effective date as `yyyy-MM-dd`.
    pub version_id: String,
    /// Effective time as `yyyyMMdd`.
    pub effective_time: u32,
    /// Branch holding the frozen content.
    pub branch_path: String,
    /// Free text description.
    pub description: String,
}

/// A code system stored on a branch of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSystem {
    /// Short name, e.g. `SNOMEDCT`.
    pub short_name: String,
    /// Repository holding the content.
    pub repository_id: String,
    /// Working branch.
    pub branch_path: String,
    /// Language settings.
    pub settings: CodeSystemSettings,
    /// Versions, oldest first.
    pub versions: Vec<CodeSystemVersion>,
}

impl CodeSystem {
    /// Creates a code system without versions.
    pub fn new(
        short_name: impl Into<String>,
        repository_id: impl Into<String>,
        branch_path: impl Into<String>,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            repository_id: repository_id.into(),
            branch_path: branch_path.into(),
            settings: CodeSystemSettings::default(),
            versions: Vec::new(),
        }
    }
}

/// Code systems by short name.
#[derive(Debug, Default)]
pub struct CodeSystemRegistry {
    code_systems: Mutex<BTreeMap<String, CodeSystem>>,
}

impl CodeSystemRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a code system.
    pub fn register(&self, code_system: CodeSystem) -> Result<()> {
        self.lock()?
            .insert(code_system.short_name.clone(), code_system);
        Ok(())
    }

    /// Looks up a code system.
    pub fn get(&self, short_name: &str) -> Result<CodeSystem> {
        self.lock()?
            .get(short_name)
            .cloned()
            .ok_or_else(|| not_found(short_name))
    }

    /// Finds the code system whose working branch is `branch_path`.
    pub fn find_by_working_branch(&self, branch_path: &str) -> Result<Option<CodeSystem>> {
        Ok(self
            .lock()?
            .values()
            .find(|cs| cs.branch_path == branch_path)
            .cloned())
    }

    /// Finds the code system whose working branch is `branch_path` or an
    /// ancestor of it, preferring the closest one.
    pub fn find_by_branch(&self, branch_path: &str) -> Result<Option<CodeSystem>> {
        Ok(self
            .lock()?
            .values()
            .filter(|cs| {
                branch_path == cs.branch_path
                    || branch_path.starts_with(&format!("{}/", cs.branch_path))
            })
            .max_by_key(|cs| cs.branch_path.len())
            .cloned())
    }

    /// Merges `settings` into the settings of a code system.
    pub fn merge_settings(
        &self,
        short_name: &str,
        settings: &CodeSystemSettings,
    ) -> Result<CodeSystemSettings> {
        let mut code_systems = self.lock()?;
        let code_system = code_systems
            .get_mut(short_name)
            .ok_or_else(|| not_found(short_name))?;
        code_system.settings.merge(settings);
        Ok(code_system.settings.clone())
    }

    /// Creates a version of a code system.
    ///
    /// The version branch `<working branch>/<yyyy-MM-dd>` is created from the
    /// current head of the working branch.
    pub fn create_version<D: Revision>(
        &self,
        index: &RevisionIndex<D>,
        short_name: &str,
        effective_time: u32,
        description: &str,
    ) -> Result<CodeSystemVersion> {
        let mut code_systems = self.lock()?;
        let code_system = code_systems
            .get_mut(short_name)
            .ok_or_else(|| not_found(short_name))?;

        let version_id = format_iso_date(effective_time);
        if let Some(latest) = code_system.versions.last() {
            if latest.effective_time >= effective_time {
                return Err(SnowowlError::bad_request(format!(
                    "Version '{}' of '{}' must be after the latest version '{}'",
                    version_id, short_name, latest.version_id
                )));
            }
        }

        let branch = index
            .create_branch(&code_system.branch_path, &version_id)
            .map_err(|err| match err {
                IndexError::BranchExists(path) => SnowowlError::Conflict(format!(
                    "Version branch '{}' already exists",
                    path
                )),
                other => map_index_error(other),
            })?;

        let version = CodeSystemVersion {
            version_id,
            effective_time,
            branch_path: branch.path,
            description: description.to_string(),
        };
        tracing::info!(
            code_system = %short_name,
            version = %version.version_id,
            branch = %version.branch_path,
            "Created code system version"
        );
        code_system.versions.push(version.clone());
        Ok(version)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, CodeSystem>>> {
        self.code_systems
            .lock()
            .map_err(|_| SnowowlError::Internal("code system registry is poisoned".to_string()))
    }
}

fn not_found(short_name: &str) -> SnowowlError {
    SnowowlError::ComponentNotFound {
        doc_type: "code system".to_string(),
        ids: vec![short_name.to_string()],
    }
}
