//! RF2 archive reader.
//!
//! Release files are tab separated, unquoted and CRLF terminated. The header
//! row of each file decides its content type; every following row is parsed
//! and checked on its own before it is handed to the caller.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator};
use snowowl_types::{
    parse_effective_time, validate_sctid, validate_sctid_of, Cardinality, ComponentCategory,
    ConcreteValue, RefsetType, ReleaseType, Rf2Component, Rf2Concept, Rf2Description,
    Rf2RefsetMember, Rf2Relationship, SctId,
};
use uuid::Uuid;

use crate::defects::DefectReporter;
use crate::types::Rf2Result;

const CONCEPT_HEADER: &[&str] = &["id", "effectiveTime", "active", "moduleId", "definitionStatusId"];

const DESCRIPTION_HEADER: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "conceptId",
    "languageCode",
    "typeId",
    "term",
    "caseSignificanceId",
];

const RELATIONSHIP_HEADER: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "sourceId",
    "destinationId",
    "relationshipGroup",
    "typeId",
    "characteristicTypeId",
    "modifierId",
];

const CONCRETE_RELATIONSHIP_HEADER: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "sourceId",
    "value",
    "relationshipGroup",
    "typeId",
    "characteristicTypeId",
    "modifierId",
];

const MEMBER_HEADER: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "refsetId",
    "referencedComponentId",
];

/// Content type of an RF2 file, decided by its header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rf2ContentType {
    /// Concepts.
    Concept,
    /// Descriptions and text definitions.
    Description,
    /// Stated and inferred relationships.
    Relationship,
    /// Relationships with concrete values.
    ConcreteRelationship,
    /// Reference set members of one pattern.
    Member(RefsetType),
}

impl Rf2ContentType {
    /// Classifies a header row. Returns `None` for unknown headers.
    pub fn classify<S: AsRef<str>>(header: &[S]) -> Option<Self> {
        let columns: Vec<&str> = header
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let column = column.as_ref().trim();
                // Handle UTF-8 BOM at start of file
                if i == 0 {
                    column.trim_start_matches('\u{feff}')
                } else {
                    column
                }
            })
            .collect();

        if columns == CONCEPT_HEADER {
            return Some(Self::Concept);
        }
        if columns == DESCRIPTION_HEADER {
            return Some(Self::Description);
        }
        if columns == RELATIONSHIP_HEADER {
            return Some(Self::Relationship);
        }
        if columns == CONCRETE_RELATIONSHIP_HEADER {
            return Some(Self::ConcreteRelationship);
        }
        if columns.len() < MEMBER_HEADER.len() || columns[..MEMBER_HEADER.len()] != *MEMBER_HEADER {
            return None;
        }
        let additional = &columns[MEMBER_HEADER.len()..];
        RefsetType::ALL
            .iter()
            .find(|refset_type| refset_type.additional_fields() == additional)
            .map(|refset_type| Self::Member(*refset_type))
    }

    /// Number of columns of this content type.
    pub fn column_count(self) -> usize {
        match self {
            Self::Concept => CONCEPT_HEADER.len(),
            Self::Description => DESCRIPTION_HEADER.len(),
            Self::Relationship => RELATIONSHIP_HEADER.len(),
            Self::ConcreteRelationship => CONCRETE_RELATIONSHIP_HEADER.len(),
            Self::Member(refset_type) => MEMBER_HEADER.len() + refset_type.additional_fields().len(),
        }
    }

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Description => "description",
            Self::Relationship => "relationship",
            Self::ConcreteRelationship => "concrete relationship",
            Self::Member(refset_type) => refset_type.name(),
        }
    }

    /// Parses and checks one row.
    ///
    /// The error is a human readable defect message.
    pub fn parse_row(self, record: &StringRecord) -> Result<Rf2Component, String> {
        if record.len() != self.column_count() {
            return Err(format!(
                "Expected {} columns, found {}",
                self.column_count(),
                record.len()
            ));
        }
        let row = Row { record };
        match self {
            Self::Concept => Ok(Rf2Component::Concept(Rf2Concept {
                id: row.sctid(0, "id", ComponentCategory::Concept)?,
                effective_time: row.effective_time(1)?,
                active: row.active(2)?,
                module_id: row.concept(3, "moduleId")?,
                definition_status_id: row.concept(4, "definitionStatusId")?,
            })),
            Self::Description => Ok(Rf2Component::Description(Rf2Description {
                id: row.sctid(0, "id", ComponentCategory::Description)?,
                effective_time: row.effective_time(1)?,
                active: row.active(2)?,
                module_id: row.concept(3, "moduleId")?,
                concept_id: row.concept(4, "conceptId")?,
                language_code: row.text(5, "languageCode")?.to_string(),
                type_id: row.concept(6, "typeId")?,
                term: row.get(7).to_string(),
                case_significance_id: row.concept(8, "caseSignificanceId")?,
            })),
            Self::Relationship | Self::ConcreteRelationship => {
                let (destination_id, value) = if self == Self::Relationship {
                    (Some(row.concept(5, "destinationId")?), None)
                } else {
                    let value = ConcreteValue::parse(row.get(5))
                        .ok_or_else(|| format!("Invalid concrete value '{}'", row.get(5)))?;
                    (None, Some(value))
                };
                Ok(Rf2Component::Relationship(Rf2Relationship {
                    id: row.sctid(0, "id", ComponentCategory::Relationship)?,
                    effective_time: row.effective_time(1)?,
                    active: row.active(2)?,
                    module_id: row.concept(3, "moduleId")?,
                    source_id: row.concept(4, "sourceId")?,
                    destination_id,
                    value,
                    relationship_group: row.integer(6, "relationshipGroup")?,
                    type_id: row.concept(7, "typeId")?,
                    characteristic_type_id: row.concept(8, "characteristicTypeId")?,
                    modifier_id: row.concept(9, "modifierId")?,
                }))
            }
            Self::Member(refset_type) => parse_member(&row, refset_type).map(Rf2Component::Member),
        }
    }
}

fn parse_member(row: &Row<'_>, refset_type: RefsetType) -> Result<Rf2RefsetMember, String> {
    let id = row.get(0);
    Uuid::parse_str(id).map_err(|_| format!("Invalid member id '{}'", id))?;

    let referenced = row.get(5);
    let (referenced_component_id, _) = validate_sctid(referenced)
        .map_err(|err| format!("Invalid referencedComponentId: {}", err))?;

    let mut member = Rf2RefsetMember::new(
        id,
        row.effective_time(1)?,
        row.active(2)?,
        row.concept(3, "moduleId")?,
        row.concept(4, "refsetId")?,
        referenced_component_id,
        refset_type,
    );

    for (offset, name) in refset_type.additional_fields().iter().enumerate() {
        let index = MEMBER_HEADER.len() + offset;
        let value = row.get(index);
        if refset_type.concept_fields().contains(name) && !value.is_empty() {
            row.concept(index, name)?;
        }
        match *name {
            "attributeCardinality" | "attributeInGroupCardinality" => {
                Cardinality::parse(value).map_err(|err| format!("Invalid {}: {}", name, err))?;
            }
            "sourceEffectiveTime" | "targetEffectiveTime" => {
                row.effective_time(index)?;
            }
            "grouped" => {
                row.active(index)?;
            }
            "mapGroup" | "mapPriority" | "descriptionLength" => {
                row.integer(index, name)?;
            }
            _ => {}
        }
        member = member.with_property(*name, value);
    }
    Ok(member)
}

struct Row<'a> {
    record: &'a StringRecord,
}

impl Row<'_> {
    fn get(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn text(&self, index: usize, name: &str) -> Result<&str, String> {
        let value = self.get(index);
        if value.is_empty() {
            Err(format!("Missing {}", name))
        } else {
            Ok(value)
        }
    }

    fn sctid(&self, index: usize, name: &str, category: ComponentCategory) -> Result<SctId, String> {
        validate_sctid_of(self.get(index), category).map_err(|err| format!("Invalid {}: {}", name, err))
    }

    fn concept(&self, index: usize, name: &str) -> Result<SctId, String> {
        self.sctid(index, name, ComponentCategory::Concept)
    }

    fn effective_time(&self, index: usize) -> Result<Option<u32>, String> {
        parse_effective_time(self.get(index)).map_err(|err| err.to_string())
    }

    fn active(&self, index: usize) -> Result<bool, String> {
        match self.get(index) {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(format!("Invalid boolean value '{}' (expected 0 or 1)", other)),
        }
    }

    fn integer(&self, index: usize, name: &str) -> Result<u32, String> {
        self.get(index)
            .parse()
            .map_err(|_| format!("Invalid {} '{}'", name, self.get(index)))
    }
}

/// Every component id a row refers to, besides its own id.
///
/// Used both to order the import and to check references.
pub fn referenced_components(component: &Rf2Component) -> Vec<SctId> {
    match component {
        Rf2Component::Concept(c) => vec![c.module_id, c.definition_status_id],
        Rf2Component::Description(d) => {
            vec![d.module_id, d.concept_id, d.type_id, d.case_significance_id]
        }
        Rf2Component::Relationship(r) => {
            let mut ids = vec![r.module_id, r.source_id, r.type_id, r.characteristic_type_id, r.modifier_id];
            ids.extend(r.destination_id);
            ids
        }
        Rf2Component::Member(m) => {
            let mut ids = vec![m.module_id, m.refset_id, m.referenced_component_id];
            ids.extend(
                m.refset_type
                    .concept_fields()
                    .iter()
                    .filter_map(|name| m.property_id(name)),
            );
            ids
        }
    }
}

/// Counters of one archive read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Release files read.
    pub files_read: usize,
    /// Entries skipped because of their name or header.
    pub files_skipped: usize,
    /// Rows handed to the caller.
    pub rows_read: usize,
    /// Rows rejected by the row checks.
    pub rows_rejected: usize,
}

/// Returns true if an archive entry is a release file of `release_type`.
pub fn is_release_file(entry_name: &str, release_type: ReleaseType) -> bool {
    let file_name = entry_name.rsplit('/').next().unwrap_or(entry_name);
    file_name.ends_with(".txt") && file_name.contains(release_type.file_marker())
}

/// Reads every release file of `release_type` from a zip archive.
///
/// Valid rows are passed to `handler` with the file name and line number;
/// invalid rows are reported to `defects`.
pub fn read_archive<F>(
    path: &Path,
    release_type: ReleaseType,
    defects: &mut DefectReporter,
    mut handler: F,
) -> Rf2Result<ReadStats>
where
    F: FnMut(&str, u64, Rf2Component) -> Rf2Result<()>,
{
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut stats = ReadStats::default();

    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if entry.is_dir() || !is_release_file(&name, release_type) {
            continue;
        }
        read_file(&name, entry, defects, &mut stats, &mut handler)?;
    }

    tracing::info!(
        archive = %path.display(),
        files = stats.files_read,
        rows = stats.rows_read,
        rejected = stats.rows_rejected,
        "Read RF2 archive"
    );
    Ok(stats)
}

/// Reads one release file.
pub fn read_file<R, F>(
    name: &str,
    reader: R,
    defects: &mut DefectReporter,
    stats: &mut ReadStats,
    handler: &mut F,
) -> Rf2Result<()>
where
    R: Read,
    F: FnMut(&str, u64, Rf2Component) -> Rf2Result<()>,
{
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .terminator(Terminator::CRLF)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut record = StringRecord::new();
    if !csv_reader.read_record(&mut record)? {
        stats.files_skipped += 1;
        return Ok(());
    }
    let header: Vec<&str> = record.iter().collect();
    let Some(content_type) = Rf2ContentType::classify(header.as_slice()) else {
        tracing::warn!(file = %name, "Unrecognised RF2 file, skipping");
        stats.files_skipped += 1;
        return Ok(());
    };

    tracing::debug!(file = %name, content_type = content_type.name(), "Reading RF2 file");
    stats.files_read += 1;

    while csv_reader.read_record(&mut record)? {
        // Skip empty records
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |position| position.line());
        match content_type.parse_row(&record) {
            Ok(component) => {
                stats.rows_read += 1;
                handler(name, line, component)?;
            }
            Err(message) => {
                stats.rows_rejected += 1;
                defects.error(name, Some(line), message);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowowl_types::well_known;

    fn make_record(line: &str) -> StringRecord {
        StringRecord::from(line.split('\t').collect::<Vec<_>>())
    }

    fn read(content: &str) -> (Vec<(u64, Rf2Component)>, DefectReporter, ReadStats) {
        let mut rows = Vec::new();
        let mut defects = DefectReporter::new();
        let mut stats = ReadStats::default();
        read_file(
            "sct2_Test_Delta_INT_20200131.txt",
            content.as_bytes(),
            &mut defects,
            &mut stats,
            &mut |_: &str, line, component| {
                rows.push((line, component));
                Ok(())
            },
        )
        .unwrap();
        (rows, defects, stats)
    }

    #[test]
    fn test_classify_core_headers() {
        assert_eq!(
            Rf2ContentType::classify(&["\u{feff}id", "effectiveTime", "active", "moduleId", "definitionStatusId"]),
            Some(Rf2ContentType::Concept)
        );
        assert_eq!(
            Rf2ContentType::classify(CONCRETE_RELATIONSHIP_HEADER),
            Some(Rf2ContentType::ConcreteRelationship)
        );
        assert_eq!(Rf2ContentType::classify(&["id", "effectiveTime"]), None);
    }

    #[test]
    fn test_classify_member_headers() {
        let mut header = MEMBER_HEADER.to_vec();
        header.push("acceptabilityId");
        assert_eq!(
            Rf2ContentType::classify(header.as_slice()),
            Some(Rf2ContentType::Member(RefsetType::Language))
        );
        assert_eq!(
            Rf2ContentType::classify(MEMBER_HEADER),
            Some(Rf2ContentType::Member(RefsetType::Simple))
        );
        header.push("unknownColumn");
        assert_eq!(Rf2ContentType::classify(header.as_slice()), None);
    }

    #[test]
    fn test_parse_concept_row() {
        let row = make_record("73211009\t20020131\t1\t900000000000207008\t900000000000074008");
        let component = Rf2ContentType::Concept.parse_row(&row).unwrap();
        assert_eq!(component.id(), "73211009");
        assert_eq!(component.effective_time(), Some(20020131));
        assert!(component.active());
    }

    #[test]
    fn test_parse_rejects_invalid_rows() {
        let wrong_category = make_record("754786011\t20020131\t1\t900000000000207008\t900000000000074008");
        let err = Rf2ContentType::Concept.parse_row(&wrong_category).unwrap_err();
        assert!(err.contains("Invalid id"), "{}", err);

        let bad_flag = make_record("73211009\t20020131\t2\t900000000000207008\t900000000000074008");
        assert!(Rf2ContentType::Concept.parse_row(&bad_flag).is_err());

        let bad_date = make_record("73211009\t20021331\t1\t900000000000207008\t900000000000074008");
        assert!(Rf2ContentType::Concept.parse_row(&bad_date).is_err());

        let short = make_record("73211009\t20020131\t1");
        assert_eq!(
            Rf2ContentType::Concept.parse_row(&short).unwrap_err(),
            "Expected 5 columns, found 3"
        );
    }

    #[test]
    fn test_parse_member_row() {
        let row = make_record(
            "a8b4ad0c-6d1e-4c36-9f3f-3a0c8f2f4c11\t\t1\t900000000000207008\t723604009\t1142135004\t723594008\t1\t0..*\t0..1\t723597001\t723596005",
        );
        let component = Rf2ContentType::Member(RefsetType::MrcmAttributeDomain)
            .parse_row(&row)
            .unwrap();
        let Rf2Component::Member(member) = component else {
            panic!("expected a member");
        };
        assert_eq!(member.effective_time, None);
        assert_eq!(member.property("attributeCardinality"), Some("0..*"));
        assert_eq!(member.property_id("domainId"), Some(723594008));

        let bad_cardinality = make_record(
            "a8b4ad0c-6d1e-4c36-9f3f-3a0c8f2f4c11\t\t1\t900000000000207008\t723604009\t1142135004\t723594008\t1\t2..1\t0..1\t723597001\t723596005",
        );
        assert!(Rf2ContentType::Member(RefsetType::MrcmAttributeDomain)
            .parse_row(&bad_cardinality)
            .is_err());

        let bad_id = make_record("not-a-uuid\t\t1\t900000000000207008\t723604009\t1142135004");
        assert!(Rf2ContentType::Member(RefsetType::Simple).parse_row(&bad_id).is_err());
    }

    #[test]
    fn test_parse_concrete_relationship_row() {
        let row = make_record("100000028\t20210731\t1\t900000000000207008\t73211009\t#5\t1\t1142135004\t900000000000011006\t900000000000451002");
        let Rf2Component::Relationship(relationship) =
            Rf2ContentType::ConcreteRelationship.parse_row(&row).unwrap()
        else {
            panic!("expected a relationship");
        };
        assert_eq!(relationship.value, Some(ConcreteValue::Integer(5)));
        assert_eq!(relationship.destination_id, None);
        assert_eq!(relationship.modifier_id, well_known::EXISTENTIAL_RESTRICTION_MODIFIER);
    }

    #[test]
    fn test_read_file_reports_defects_with_lines() {
        let content = "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\r\n\
                       73211009\t20020131\t1\t900000000000207008\t900000000000074008\r\n\
                       100005\t2002013\t1\t900000000000207008\t900000000000074008\r\n\
                       \r\n";
        let (rows, defects, stats) = read(content);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, 2);
        assert_eq!(stats.rows_rejected, 1);
        assert_eq!(defects.defects()[0].line, Some(3));
        assert!(defects.has_errors());
    }

    #[test]
    fn test_read_file_skips_unknown_header() {
        let (rows, defects, stats) = read("foo\tbar\r\n1\t2\r\n");
        assert!(rows.is_empty());
        assert!(!defects.has_errors());
        assert_eq!(stats.files_skipped, 1);
    }

    #[test]
    fn test_terms_keep_quotes() {
        let content = "id\teffectiveTime\tactive\tmoduleId\tconceptId\tlanguageCode\ttypeId\tterm\tcaseSignificanceId\r\n\
                       754786011\t20020131\t1\t900000000000207008\t73211009\ten\t900000000000013009\t\"Quoted\" term\t900000000000448009\r\n";
        let (rows, _, _) = read(content);
        let Rf2Component::Description(description) = &rows[0].1 else {
            panic!("expected a description");
        };
        assert_eq!(description.term, "\"Quoted\" term");
    }

    #[test]
    fn test_release_file_names() {
        assert!(is_release_file(
            "SnomedCT/Delta/Terminology/sct2_Concept_Delta_INT_20200131.txt",
            ReleaseType::Delta
        ));
        assert!(is_release_file(
            "der2_cRefset_LanguageDelta-en_INT_20200131.txt",
            ReleaseType::Delta
        ));
        assert!(!is_release_file("sct2_Concept_Snapshot_INT_20200131.txt", ReleaseType::Delta));
        assert!(!is_release_file("Readme_Delta.pdf", ReleaseType::Delta));
    }

    #[test]
    fn test_referenced_components_of_member() {
        let member = Rf2Component::Member(
            Rf2RefsetMember::new(
                "3ad4a4b2-3e04-5d1c-9a2b-2a3a8c0d6f1e",
                None,
                true,
                well_known::SNOMED_CT_CORE_MODULE,
                well_known::US_ENGLISH_LANGUAGE_REFSET,
                754786011,
                RefsetType::Language,
            )
            .with_property("acceptabilityId", "900000000000548007"),
        );
        assert_eq!(
            referenced_components(&member),
            vec![
                well_known::SNOMED_CT_CORE_MODULE,
                well_known::US_ENGLISH_LANGUAGE_REFSET,
                754786011,
                900000000000548007,
            ]
        );
    }
}
