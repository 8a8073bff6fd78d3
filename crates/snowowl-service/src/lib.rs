//! # snowowl-service
//!
//! Runs one RF2 import against an in-memory SNOMED CT repository.
//!
//! The import is configured through environment variables:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SNOWOWL_RF2_ARCHIVE` | Path of the RF2 zip archive | required |
//! | `SNOWOWL_RELEASE_TYPE` | `FULL`, `SNAPSHOT` or `DELTA` | `SNAPSHOT` |
//! | `SNOWOWL_BRANCH` | Target branch | `MAIN` |
//! | `SNOWOWL_CREATE_VERSIONS` | Version every published slice | `false` |
//! | `SNOWOWL_DRY_RUN` | Validate only | `false` |
//! | `SNOWOWL_BATCH_SIZE` | Components per commit | `60000` |
//! | `SNOWOWL_AUTHOR` | Commit author | `snowowl-import` |
//! | `SNOWOWL_IMPORT_UNTIL` | Last effective time to import | none |
//! | `SNOWOWL_IGNORE_MISSING_REFERENCES_IN` | Comma separated reference set ids | none |

#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use snowowl_core::{CodeSystem, CodeSystemRegistry, SnowowlError};
use snowowl_snomed::{snomed_repository, Rf2Error, Rf2ImportConfig, Rf2ImportResponse, Rf2Importer};
use snowowl_types::{parse_effective_time, ReleaseType};
use thiserror::Error;

/// Id of the SNOMED CT repository.
pub const REPOSITORY_ID: &str = "snomedStore";

/// Short name of the SNOMED CT code system.
pub const CODE_SYSTEM: &str = "SNOMEDCT";

const DEFAULT_BRANCH: &str = "MAIN";

/// Errors of the import command.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A setting is missing or malformed.
    #[error("Invalid setting {name}: {message}")]
    Config {
        /// Environment variable name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The import failed.
    #[error(transparent)]
    Import(#[from] Rf2Error),

    /// The repository could not be set up.
    #[error(transparent)]
    Repository(#[from] SnowowlError),
}

/// Settings of one import run.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    /// Archive to import.
    pub archive: PathBuf,
    /// Target branch.
    pub branch: String,
    /// Import options.
    pub config: Rf2ImportConfig,
}

impl ImportSettings {
    /// Reads the settings from the environment.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let archive = lookup("SNOWOWL_RF2_ARCHIVE")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ServiceError::Config {
                name: "SNOWOWL_RF2_ARCHIVE",
                message: "not set".to_string(),
            })?;

        let mut config = Rf2ImportConfig::default();
        if let Some(value) = lookup("SNOWOWL_RELEASE_TYPE") {
            config.release_type = value.parse::<ReleaseType>().map_err(|err| ServiceError::Config {
                name: "SNOWOWL_RELEASE_TYPE",
                message: err.to_string(),
            })?;
        }
        if let Some(value) = lookup("SNOWOWL_CREATE_VERSIONS") {
            config.create_versions = parse_flag("SNOWOWL_CREATE_VERSIONS", &value)?;
        }
        if let Some(value) = lookup("SNOWOWL_DRY_RUN") {
            config.dry_run = parse_flag("SNOWOWL_DRY_RUN", &value)?;
        }
        if let Some(value) = lookup("SNOWOWL_BATCH_SIZE") {
            config.batch_size = value
                .trim()
                .parse()
                .ok()
                .filter(|size: &usize| *size > 0)
                .ok_or_else(|| ServiceError::Config {
                    name: "SNOWOWL_BATCH_SIZE",
                    message: format!("'{}' is not a positive number", value),
                })?;
        }
        if let Some(value) = lookup("SNOWOWL_AUTHOR") {
            config.author = value;
        }
        if let Some(value) = lookup("SNOWOWL_IMPORT_UNTIL") {
            config.import_until = parse_effective_time(value.trim()).map_err(|err| ServiceError::Config {
                name: "SNOWOWL_IMPORT_UNTIL",
                message: err.to_string(),
            })?;
        }
        if let Some(value) = lookup("SNOWOWL_IGNORE_MISSING_REFERENCES_IN") {
            config.ignore_missing_references_in = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(Self {
            archive: PathBuf::from(archive),
            branch: lookup("SNOWOWL_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            config,
        })
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ServiceError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ServiceError::Config {
            name,
            message: format!("'{}' is not a boolean", value),
        }),
    }
}

/// Sets up a fresh repository with the SNOMED CT code system on `MAIN` and
/// runs the import.
pub fn run(settings: &ImportSettings) -> Result<Rf2ImportResponse, ServiceError> {
    let repository = Arc::new(snomed_repository(REPOSITORY_ID));
    let code_systems = Arc::new(CodeSystemRegistry::new());
    code_systems.register(CodeSystem::new(CODE_SYSTEM, REPOSITORY_ID, DEFAULT_BRANCH))?;

    let importer = Rf2Importer::new(repository, code_systems);
    Ok(importer.import(&settings.branch, &settings.archive, &settings.config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowowl_snomed::ImportStatus;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn make_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ImportSettings::from_lookup(make_env(&[("SNOWOWL_RF2_ARCHIVE", "release.zip")])).unwrap();
        assert_eq!(settings.archive, PathBuf::from("release.zip"));
        assert_eq!(settings.branch, "MAIN");
        assert_eq!(settings.config.release_type, ReleaseType::Snapshot);
        assert_eq!(settings.config.batch_size, 60_000);
        assert!(!settings.config.dry_run);
    }

    #[test]
    fn test_all_settings() {
        let settings = ImportSettings::from_lookup(make_env(&[
            ("SNOWOWL_RF2_ARCHIVE", "delta.zip"),
            ("SNOWOWL_RELEASE_TYPE", "DELTA"),
            ("SNOWOWL_BRANCH", "MAIN/extension"),
            ("SNOWOWL_CREATE_VERSIONS", "true"),
            ("SNOWOWL_DRY_RUN", "1"),
            ("SNOWOWL_BATCH_SIZE", "500"),
            ("SNOWOWL_AUTHOR", "release-team"),
            ("SNOWOWL_IMPORT_UNTIL", "20200131"),
            ("SNOWOWL_IGNORE_MISSING_REFERENCES_IN", "723264001, 447562003"),
        ]))
        .unwrap();
        assert_eq!(settings.branch, "MAIN/extension");
        assert_eq!(settings.config.release_type, ReleaseType::Delta);
        assert!(settings.config.create_versions);
        assert!(settings.config.dry_run);
        assert_eq!(settings.config.batch_size, 500);
        assert_eq!(settings.config.author, "release-team");
        assert_eq!(settings.config.import_until, Some(20200131));
        assert_eq!(settings.config.ignore_missing_references_in.len(), 2);
        assert!(settings.config.ignore_missing_references_in.contains("447562003"));
    }

    #[test]
    fn test_invalid_settings() {
        let missing = ImportSettings::from_lookup(make_env(&[]));
        assert!(matches!(missing, Err(ServiceError::Config { name: "SNOWOWL_RF2_ARCHIVE", .. })));

        let batch = ImportSettings::from_lookup(make_env(&[
            ("SNOWOWL_RF2_ARCHIVE", "release.zip"),
            ("SNOWOWL_BATCH_SIZE", "0"),
        ]));
        assert!(matches!(batch, Err(ServiceError::Config { name: "SNOWOWL_BATCH_SIZE", .. })));

        let release = ImportSettings::from_lookup(make_env(&[
            ("SNOWOWL_RF2_ARCHIVE", "release.zip"),
            ("SNOWOWL_RELEASE_TYPE", "weekly"),
        ]));
        assert!(matches!(release, Err(ServiceError::Config { name: "SNOWOWL_RELEASE_TYPE", .. })));
    }

    #[test]
    fn test_run_snapshot_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("release.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        writer
            .start_file("sct2_Concept_Snapshot_INT_20020131.txt", SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(
                b"id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\r\n\
                  900000000000207008\t20020131\t1\t900000000000207008\t900000000000074008\r\n\
                  900000000000074008\t20020131\t1\t900000000000207008\t900000000000074008\r\n",
            )
            .unwrap();
        writer.finish().unwrap();

        let settings = ImportSettings::from_lookup(make_env(&[(
            "SNOWOWL_RF2_ARCHIVE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        let response = run(&settings).unwrap();
        assert_eq!(response.status, ImportStatus::Completed);
        assert_eq!(response.imported_slices, vec!["SNAPSHOT"]);
    }
}
