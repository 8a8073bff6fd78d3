use crate::{BufferedNotificationSink, Repository};
use snowowl_index::{DocumentKind, Mappings, ObjectId, Revision};
use std::sync::Arc;

pub const CONCEPT: DocumentKind = DocumentKind("Concept");
pub const DESCRIPTION: DocumentKind = DocumentKind("Description");

#[derive(Debug, Clone, PartialEq)]
pub struct TestDoc {
    pub kind: DocumentKind,
    pub id: String,
    pub term: String,
    pub concept_id: Option<String>,
    pub released: bool,
}

impl Revision for TestDoc {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn container(&self) -> ObjectId {
        match &self.concept_id {
            Some(concept_id) => ObjectId::new(CONCEPT, concept_id.clone()),
            None => self.object_id(),
        }
    }
}

pub fn make_concept(id: &str) -> TestDoc {
    TestDoc {
        kind: CONCEPT,
        id: id.to_string(),
        term: String::new(),
        concept_id: None,
        released: false,
    }
}

pub fn make_description(id: &str, concept_id: &str, term: &str) -> TestDoc {
    TestDoc {
        kind: DESCRIPTION,
        id: id.to_string(),
        term: term.to_string(),
        concept_id: Some(concept_id.to_string()),
        released: false,
    }
}

pub fn make_repository() -> Repository<TestDoc> {
    Repository::new("testStore", Mappings::new([CONCEPT, DESCRIPTION])).with_notifications(None)
}

pub fn make_observed_repository() -> (Repository<TestDoc>, Arc<BufferedNotificationSink>) {
    let sink = Arc::new(BufferedNotificationSink::new());
    let repository = make_repository().with_notifications(Some(sink.clone()));
    (repository, sink)
}
