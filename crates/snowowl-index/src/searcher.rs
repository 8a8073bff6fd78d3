//! Point-in-time reads against one branch.

use crate::{DocumentKind, ObjectId, Result, Revision, RevisionIndex};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

type Filter<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;

/// A query over one document kind.
///
/// Results are ordered by id. Pagination uses `search_after`: the next page
/// starts after the last id of the previous one.
pub struct Query<D> {
    kind: DocumentKind,
    ids: Option<BTreeSet<String>>,
    filter: Option<Filter<D>>,
    limit: usize,
    search_after: Option<String>,
}

impl<D> Clone for Query<D> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            ids: self.ids.clone(),
            filter: self.filter.clone(),
            limit: self.limit,
            search_after: self.search_after.clone(),
        }
    }
}

impl<D> fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", &self.kind)
            .field("ids", &self.ids)
            .field("filtered", &self.filter.is_some())
            .field("limit", &self.limit)
            .field("search_after", &self.search_after)
            .finish()
    }
}

impl<D: Revision> Query<D> {
    /// Matches every document of `kind`.
    pub fn select(kind: DocumentKind) -> Self {
        Self {
            kind,
            ids: None,
            filter: None,
            limit: usize::MAX,
            search_after: None,
        }
    }

    /// Restricts the query to the given ids.
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Keeps only documents matching `predicate`.
    pub fn filter(mut self, predicate: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Maximum number of hits returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns hits after the given id.
    pub fn search_after(mut self, id: impl Into<String>) -> Self {
        self.search_after = Some(id.into());
        self
    }

    fn matches(&self, doc: &D) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(doc.id()))
            && self.filter.as_ref().map_or(true, |filter| filter(doc))
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct Hits<D> {
    /// Matching documents of this page, ordered by id.
    pub items: Vec<D>,
    /// Number of matching documents across all pages.
    pub total: usize,
    /// Id to pass to `search_after` for the next page; `None` on the last page.
    pub search_after: Option<String>,
}

/// Reads documents of one branch as of a fixed timestamp.
pub struct RevisionSearcher<D> {
    index: RevisionIndex<D>,
    branch: String,
    timestamp: i64,
}

impl<D> Clone for RevisionSearcher<D> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            branch: self.branch.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl<D: Revision> RevisionSearcher<D> {
    pub(crate) fn new(index: RevisionIndex<D>, branch: String, timestamp: i64) -> Self {
        Self {
            index,
            branch,
            timestamp,
        }
    }

    /// Branch this searcher reads.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Timestamp this searcher is pinned at.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Fetches one document.
    pub fn get(&self, kind: DocumentKind, id: &str) -> Result<Option<D>> {
        self.index
            .state()?
            .resolve(&self.branch, &ObjectId::new(kind, id), self.timestamp)
    }

    /// Fetches the documents that exist among `ids`, in the order given.
    pub fn get_all<S: AsRef<str>>(&self, kind: DocumentKind, ids: &[S]) -> Result<Vec<D>> {
        let state = self.index.state()?;
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            let key = ObjectId::new(kind, id.as_ref());
            if let Some(doc) = state.resolve(&self.branch, &key, self.timestamp)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Runs a query.
    pub fn search(&self, query: &Query<D>) -> Result<Hits<D>> {
        let visible = self
            .index
            .state()?
            .visible(&self.branch, query.kind, self.timestamp)?;

        let matching: Vec<D> = visible.into_values().filter(|doc| query.matches(doc)).collect();
        let total = matching.len();

        let mut remaining = matching
            .into_iter()
            .filter(|doc| {
                query
                    .search_after
                    .as_deref()
                    .map_or(true, |after| doc.id() > after)
            })
            .peekable();

        let mut items = Vec::new();
        while items.len() < query.limit {
            match remaining.next() {
                Some(doc) => items.push(doc),
                None => break,
            }
        }
        let search_after = match (remaining.peek(), items.last()) {
            (Some(_), Some(last)) => Some(last.id().to_string()),
            _ => None,
        };

        Ok(Hits {
            items,
            total,
            search_after,
        })
    }

    /// Streams every document of `kind` in pages of `page_size`.
    pub fn scroll(&self, kind: DocumentKind, page_size: usize) -> Scroll<D> {
        Scroll {
            searcher: self.clone(),
            query: Query::select(kind).limit(page_size.max(1)),
            done: false,
        }
    }
}

/// Iterator over the pages of a scrolled query.
pub struct Scroll<D> {
    searcher: RevisionSearcher<D>,
    query: Query<D>,
    done: bool,
}

impl<D: Revision> Iterator for Scroll<D> {
    type Item = Result<Vec<D>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.searcher.search(&self.query) {
            Ok(hits) => {
                match hits.search_after {
                    Some(after) => self.query = self.query.clone().search_after(after),
                    None => self.done = true,
                }
                if hits.items.is_empty() {
                    None
                } else {
                    Some(Ok(hits.items))
                }
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
