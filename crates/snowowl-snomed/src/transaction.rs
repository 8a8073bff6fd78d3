//! Stages RF2 rows as SNOMED CT documents.

use std::collections::{BTreeSet, HashMap};

use snowowl_core::RepositoryTransactionContext;
use snowowl_index::{Commit, DocumentKind, Revision};
use snowowl_types::{category_of, validate_sctid, Rf2Component, Rf2RefsetMember};

use crate::documents::{
    SnomedDocument, CONCEPT, DESCRIPTION, IMPORT_ORDER, MEMBER, RELATIONSHIP,
    UNSPECIFIED_COMPONENT_TYPE,
};
use crate::types::Rf2Result;

/// Lock description of import transactions.
pub const IMPORT_LOCK_DESCRIPTION: &str = "import";

/// A repository transaction that accepts RF2 rows.
pub struct Rf2TransactionContext {
    inner: RepositoryTransactionContext<SnomedDocument>,
}

impl Rf2TransactionContext {
    /// Wraps a repository transaction.
    pub fn new(inner: RepositoryTransactionContext<SnomedDocument>) -> Self {
        Self {
            inner: inner.with_parent_lock(IMPORT_LOCK_DESCRIPTION),
        }
    }

    /// The wrapped transaction.
    pub fn inner(&self) -> &RepositoryTransactionContext<SnomedDocument> {
        &self.inner
    }

    /// Stages the given rows, concepts first and members last.
    ///
    /// A published row replaces the current revision only if it is strictly
    /// newer; unpublished rows always replace it. Members also stamp their
    /// reference set pattern on the reference set concept. Returns the number
    /// of rows staged.
    pub fn add(&mut self, components: Vec<Rf2Component>) -> Rf2Result<usize> {
        let mut by_kind: HashMap<DocumentKind, Vec<Rf2Component>> = HashMap::new();
        for component in components {
            by_kind.entry(kind_of_row(&component)).or_default().push(component);
        }

        let mut staged = 0;
        for kind in IMPORT_ORDER {
            let Some(rows) = by_kind.remove(&kind) else {
                continue;
            };
            let ids: Vec<String> = rows.iter().map(Rf2Component::id).collect();
            let existing: HashMap<String, SnomedDocument> = self
                .inner
                .lookup_if_exists(kind, ids.as_slice())?
                .into_iter()
                .map(|doc| (doc.id().to_string(), doc))
                .collect();

            let mut refsets_seen = BTreeSet::new();
            for row in &rows {
                let previous = existing.get(&row.id());
                if should_apply(row, previous) {
                    let doc = SnomedDocument::from_rf2(row, previous);
                    match previous {
                        Some(previous) => self.inner.update(previous.clone(), doc)?,
                        None => self.inner.add(doc)?,
                    }
                    staged += 1;
                }
                self.register_obligations(row);

                if let Rf2Component::Member(member) = row {
                    if refsets_seen.insert(member.refset_id) {
                        self.attach_refset_properties(member)?;
                    }
                }
            }
        }
        Ok(staged)
    }

    /// Commits the staged rows.
    pub fn commit(&mut self, author: &str, comment: &str) -> Rf2Result<Option<Commit>> {
        Ok(self.inner.commit(author, comment, None)?)
    }

    fn register_obligations(&mut self, row: &Rf2Component) {
        let required = match row {
            Rf2Component::Concept(_) => None,
            Rf2Component::Description(description) => Some(description.concept_id),
            Rf2Component::Relationship(relationship) => Some(relationship.source_id),
            Rf2Component::Member(member) => Some(member.refset_id),
        };
        if let Some(id) = required {
            self.inner.ensure_present(CONCEPT, [id.to_string()]);
        }
    }

    fn attach_refset_properties(&mut self, member: &Rf2RefsetMember) -> Rf2Result<()> {
        let refset_id = member.refset_id.to_string();
        let Some(current) = self
            .inner
            .lookup_if_exists(CONCEPT, &[refset_id.as_str()])?
            .pop()
        else {
            return Ok(());
        };
        let Some(concept) = current.as_concept() else {
            return Ok(());
        };
        if concept.refset_type.is_some() {
            return Ok(());
        }

        let mut updated = concept.clone();
        updated.refset_type = Some(member.refset_type);
        updated.referenced_component_type = category_of(member.referenced_component_id)
            .map(|category| category.name().to_string());
        updated.map_target_component_type = Some(
            member
                .property("mapTarget")
                .and_then(|target| validate_sctid(target).ok())
                .map_or(UNSPECIFIED_COMPONENT_TYPE, |(_, category)| category.name())
                .to_string(),
        );
        self.inner.update(current, SnomedDocument::Concept(updated))?;
        Ok(())
    }
}

fn kind_of_row(component: &Rf2Component) -> DocumentKind {
    match component {
        Rf2Component::Concept(_) => CONCEPT,
        Rf2Component::Description(_) => DESCRIPTION,
        Rf2Component::Relationship(_) => RELATIONSHIP,
        Rf2Component::Member(_) => MEMBER,
    }
}

fn should_apply(row: &Rf2Component, previous: Option<&SnomedDocument>) -> bool {
    match (row.effective_time(), previous.and_then(SnomedDocument::effective_time)) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(incoming), Some(current)) => incoming > current,
    }
}
