//! Error and configuration types of the RF2 import.

use snowowl_core::SnowowlError;
use snowowl_index::IndexError;
use snowowl_types::ReleaseType;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur while importing an RF2 release.
#[derive(Error, Debug)]
pub enum Rf2Error {
    /// I/O error reading the release archive.
    #[error("IO error reading RF2 archive: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The archive is not a readable zip file.
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The temporary slice store failed.
    #[error("Slice store error: {0}")]
    SliceStore(#[from] rusqlite::Error),

    /// A row could not be encoded or decoded for the slice store.
    #[error("Row encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value that cannot be imported.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Reading the target branch failed.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// The repository rejected the import or one of its commits.
    #[error(transparent)]
    Repository(#[from] SnowowlError),
}

/// Result type for RF2 operations.
pub type Rf2Result<T> = Result<T, Rf2Error>;

/// Settings of one RF2 import.
#[derive(Debug, Clone)]
pub struct Rf2ImportConfig {
    /// Which files of the archive to read.
    pub release_type: ReleaseType,
    /// Create a code system version after every published slice.
    pub create_versions: bool,
    /// Reference sets whose members may point at missing components.
    pub ignore_missing_references_in: BTreeSet<String>,
    /// Slices after this effective time are skipped.
    pub import_until: Option<u32>,
    /// Upper bound on the components committed together.
    pub batch_size: usize,
    /// Validate only, write nothing.
    pub dry_run: bool,
    /// Author recorded on every import commit.
    pub author: String,
    /// Rows buffered per slice before they are written to the slice store.
    pub flush_threshold: usize,
}

impl Default for Rf2ImportConfig {
    fn default() -> Self {
        Self {
            release_type: ReleaseType::default(),
            create_versions: false,
            ignore_missing_references_in: BTreeSet::new(),
            import_until: None,
            batch_size: 60_000,
            dry_run: false,
            author: "snowowl-import".to_string(),
            flush_threshold: 5_000,
        }
    }
}

impl Rf2ImportConfig {
    /// Creates a config for the given release type.
    pub fn new(release_type: ReleaseType) -> Self {
        Self {
            release_type,
            ..Default::default()
        }
    }
}
