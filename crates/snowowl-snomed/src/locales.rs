//! Language settings derived from the active language reference sets.

use std::collections::BTreeMap;

use snowowl_core::{CodeSystemRegistry, CodeSystemSettings};
use snowowl_index::RevisionSearcher;
use snowowl_types::{well_known, RefsetType, SctId};

use crate::documents::{SnomedDocument, DESCRIPTION, MEMBER};
use crate::types::Rf2Result;

const SCROLL_PAGE: usize = 10_000;
const DEFAULT_LANGUAGE: &str = "en";

/// Computes locales and language tags from the active language reference
/// set members visible to `searcher`.
///
/// Every language reference set yields the locale `<lang>-x-<refsetId>`.
/// The US and GB English reference sets are also known by their dialect tag.
pub fn language_settings(searcher: &RevisionSearcher<SnomedDocument>) -> Rf2Result<CodeSystemSettings> {
    // refset id -> one referenced description
    let mut refsets: BTreeMap<String, String> = BTreeMap::new();
    for page in searcher.scroll(MEMBER, SCROLL_PAGE) {
        for doc in page? {
            let Some(member) = doc.as_member() else {
                continue;
            };
            if member.active && member.refset_type == RefsetType::Language {
                refsets
                    .entry(member.refset_id.clone())
                    .or_insert_with(|| member.referenced_component_id.clone());
            }
        }
    }

    let mut settings = CodeSystemSettings::default();
    for (refset_id, description_id) in refsets {
        let language = searcher
            .get(DESCRIPTION, &description_id)?
            .and_then(|doc| doc.as_description().map(|d| d.language_code.clone()))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let locale = format!("{}-x-{}", language, refset_id);
        let tag = dialect_tag(&refset_id).map_or_else(|| locale.clone(), str::to_string);
        settings.locales.insert(locale);
        settings.locales.insert(tag.clone());
        settings.languages.entry(tag).or_default().insert(refset_id);
    }
    Ok(settings)
}

/// Merges the language settings of the branch into a code system.
pub fn update_locales(
    registry: &CodeSystemRegistry,
    short_name: &str,
    searcher: &RevisionSearcher<SnomedDocument>,
) -> Rf2Result<CodeSystemSettings> {
    let computed = language_settings(searcher)?;
    let merged = registry.merge_settings(short_name, &computed)?;
    tracing::info!(
        code_system = %short_name,
        locales = merged.locales.len(),
        "Updated code system language settings"
    );
    Ok(merged)
}

fn dialect_tag(refset_id: &str) -> Option<&'static str> {
    let id: SctId = refset_id.parse().ok()?;
    match id {
        well_known::US_ENGLISH_LANGUAGE_REFSET => Some("en-us"),
        well_known::GB_ENGLISH_LANGUAGE_REFSET => Some("en-gb"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::snomed_repository;
    use snowowl_core::{CodeSystem, Repository};
    use snowowl_types::{Rf2Component, Rf2Description, Rf2RefsetMember};

    fn make_description(id: SctId, language_code: &str) -> SnomedDocument {
        SnomedDocument::from_rf2(
            &Rf2Component::Description(Rf2Description {
                id,
                effective_time: Some(20200131),
                active: true,
                module_id: well_known::SNOMED_CT_CORE_MODULE,
                concept_id: 73211009,
                language_code: language_code.to_string(),
                type_id: 900000000000013009,
                term: "Heart".to_string(),
                case_significance_id: 900000000000448009,
            }),
            None,
        )
    }

    fn make_language_member(id: &str, refset_id: SctId, description_id: SctId, active: bool) -> SnomedDocument {
        let member = Rf2RefsetMember::new(
            id,
            Some(20200131),
            active,
            well_known::SNOMED_CT_CORE_MODULE,
            refset_id,
            description_id,
            RefsetType::Language,
        )
        .with_property("acceptabilityId", "900000000000548007");
        SnomedDocument::from_rf2(&Rf2Component::Member(member), None)
    }

    fn make_repository(docs: Vec<SnomedDocument>) -> Repository<SnomedDocument> {
        let repository = snomed_repository("snomedStore");
        let mut tx = repository.open_transaction("MAIN", "importer").unwrap();
        for doc in docs {
            tx.add(doc).unwrap();
        }
        tx.commit("importer", "language refsets", None).unwrap();
        repository
    }

    #[test]
    fn test_language_settings() {
        let repository = make_repository(vec![
            make_description(754786011, "en"),
            make_description(754787019, "da"),
            make_language_member("0a1f6e41-6bd1-4f4c-9a3f-2fd4d6a1c0e1", well_known::US_ENGLISH_LANGUAGE_REFSET, 754786011, true),
            make_language_member("0a1f6e41-6bd1-4f4c-9a3f-2fd4d6a1c0e2", 554461000005103, 754787019, true),
            make_language_member("0a1f6e41-6bd1-4f4c-9a3f-2fd4d6a1c0e3", well_known::GB_ENGLISH_LANGUAGE_REFSET, 754786011, false),
        ]);
        let settings = language_settings(&repository.index().read("MAIN").unwrap()).unwrap();

        assert!(settings.locales.contains("en-us"));
        assert!(settings.locales.contains("en-x-900000000000509007"));
        assert!(settings.locales.contains("da-x-554461000005103"));
        assert!(!settings.locales.contains("en-gb"));
        assert!(settings.languages["en-us"].contains("900000000000509007"));
        assert!(settings.languages["da-x-554461000005103"].contains("554461000005103"));
    }

    #[test]
    fn test_update_locales_is_additive() {
        let repository = make_repository(vec![
            make_description(754786011, "en"),
            make_language_member("0a1f6e41-6bd1-4f4c-9a3f-2fd4d6a1c0e1", well_known::US_ENGLISH_LANGUAGE_REFSET, 754786011, true),
        ]);
        let registry = CodeSystemRegistry::new();
        let mut code_system = CodeSystem::new("SNOMEDCT", "snomedStore", "MAIN");
        code_system.settings.locales.insert("sv-x-46011000052107".to_string());
        registry.register(code_system).unwrap();

        let merged = update_locales(&registry, "SNOMEDCT", &repository.index().read("MAIN").unwrap()).unwrap();
        assert!(merged.locales.contains("sv-x-46011000052107"));
        assert!(merged.locales.contains("en-us"));
        assert_eq!(registry.get("SNOMEDCT").unwrap().settings, merged);
    }
}
