use crate::{DocumentKind, Mappings, ObjectId, Revision, RevisionIndex};

pub const NOTE: DocumentKind = DocumentKind("note");
pub const TAG: DocumentKind = DocumentKind("tag");

#[derive(Debug, Clone, PartialEq)]
pub struct TestDoc {
    pub kind: DocumentKind,
    pub id: String,
    pub value: String,
    pub parent: Option<String>,
}

impl Revision for TestDoc {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn container(&self) -> ObjectId {
        match &self.parent {
            Some(parent) => ObjectId::new(NOTE, parent.clone()),
            None => self.object_id(),
        }
    }
}

pub fn make_doc(kind: DocumentKind, id: &str, value: &str) -> TestDoc {
    TestDoc {
        kind,
        id: id.to_string(),
        value: value.to_string(),
        parent: None,
    }
}

pub fn make_child(id: &str, parent: &str) -> TestDoc {
    TestDoc {
        kind: TAG,
        id: id.to_string(),
        value: String::new(),
        parent: Some(parent.to_string()),
    }
}

pub fn make_index() -> RevisionIndex<TestDoc> {
    RevisionIndex::new(Mappings::new([NOTE, TAG]))
}
