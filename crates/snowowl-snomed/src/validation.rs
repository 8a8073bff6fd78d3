//! Global reference validation of an RF2 archive.
//!
//! Runs after every row of the archive has been read and before anything is
//! written: each id a row refers to must either be imported by the same
//! archive or already exist on the target branch.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use snowowl_index::{DocumentKind, Revision, RevisionSearcher};
use snowowl_types::{category_of, Rf2Component, SctId};

use crate::defects::DefectReporter;
use crate::documents::{kind_of_id, SnomedDocument};
use crate::parser::referenced_components;
use crate::types::Rf2Result;

const LOOKUP_CHUNK: usize = 10_000;

#[derive(Debug, Clone)]
struct Reference {
    file: String,
    line: u64,
    referrer: String,
    ignorable: bool,
}

/// Collects the ids an archive imports and refers to.
#[derive(Debug, Default)]
pub struct ReferenceValidator {
    ignore_missing_references_in: BTreeSet<String>,
    imported: HashSet<SctId>,
    references: HashMap<SctId, Reference>,
}

impl ReferenceValidator {
    /// Creates a validator. Members of the listed reference sets may refer
    /// to missing components; those are reported as warnings.
    pub fn new(ignore_missing_references_in: &BTreeSet<String>) -> Self {
        Self {
            ignore_missing_references_in: ignore_missing_references_in.clone(),
            ..Default::default()
        }
    }

    /// Records a row read from `file` at `line`.
    pub fn collect(&mut self, file: &str, line: u64, component: &Rf2Component) {
        let ignorable = match component {
            Rf2Component::Member(member) => self
                .ignore_missing_references_in
                .contains(&member.refset_id.to_string()),
            _ => false,
        };
        if let Ok(id) = component.id().parse::<SctId>() {
            self.imported.insert(id);
        }

        for referenced in referenced_components(component) {
            match self.references.entry(referenced) {
                Entry::Vacant(entry) => {
                    entry.insert(Reference {
                        file: file.to_string(),
                        line,
                        referrer: component.id(),
                        ignorable,
                    });
                }
                Entry::Occupied(mut entry) => {
                    // A strict reference wins over a lenient one
                    if entry.get().ignorable && !ignorable {
                        entry.insert(Reference {
                            file: file.to_string(),
                            line,
                            referrer: component.id(),
                            ignorable,
                        });
                    }
                }
            }
        }
    }

    /// Number of distinct ids referred to.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Reports every referenced id that is neither imported nor present on
    /// the searcher's branch. Returns the number of missing ids.
    pub fn validate(
        &self,
        searcher: &RevisionSearcher<SnomedDocument>,
        defects: &mut DefectReporter,
    ) -> Rf2Result<usize> {
        let mut candidates: BTreeMap<DocumentKind, Vec<SctId>> = BTreeMap::new();
        for id in self.references.keys() {
            if !self.imported.contains(id) {
                candidates.entry(kind_of_id(*id)).or_default().push(*id);
            }
        }

        let mut missing = 0;
        for (kind, mut ids) in candidates {
            ids.sort_unstable();
            for chunk in ids.chunks(LOOKUP_CHUNK) {
                let keys: Vec<String> = chunk.iter().map(ToString::to_string).collect();
                let found: HashSet<String> = searcher
                    .get_all(kind, keys.as_slice())?
                    .iter()
                    .map(|doc| doc.id().to_string())
                    .collect();

                for id in chunk {
                    if found.contains(&id.to_string()) {
                        continue;
                    }
                    missing += 1;
                    self.report(*id, defects);
                }
            }
        }

        tracing::info!(
            branch = %searcher.branch(),
            references = self.references.len(),
            missing,
            "Validated component references"
        );
        Ok(missing)
    }

    fn report(&self, id: SctId, defects: &mut DefectReporter) {
        let Some(reference) = self.references.get(&id) else {
            return;
        };
        let category = category_of(id).map_or("component", |category| category.name());
        let message = format!(
            "Component '{}' references missing {} '{}'",
            reference.referrer, category, id
        );
        if reference.ignorable {
            defects.warn(&reference.file, Some(reference.line), message);
        } else {
            defects.error(&reference.file, Some(reference.line), message);
        }
    }
}
