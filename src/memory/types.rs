//! Value types shared by the fact memory and the document retriever.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A (subject, predicate, object) fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triplet {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for Triplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

/// Triplets reachable from each seed subject of one traversal.
///
/// Every seed has an entry, possibly empty. Per-subject lists keep
/// breadth-first discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationMap {
    entries: HashMap<String, Vec<Triplet>>,
    truncated: bool,
}

impl RelationMap {
    pub(crate) fn from_entries(
        entries: HashMap<String, Vec<Triplet>>,
        truncated: bool,
    ) -> Self {
        Self { entries, truncated }
    }

    /// Whether the limit forced at least one fetched triplet to be dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Triplets collected for `subject`, if it was a seed.
    pub fn get(&self, subject: &str) -> Option<&[Triplet]> {
        self.entries.get(subject).map(Vec::as_slice)
    }

    /// Number of seed subjects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total triplets across all subjects.
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Triplet])> {
        self.entries
            .iter()
            .map(|(subject, triplets)| (subject.as_str(), triplets.as_slice()))
    }

    pub fn into_inner(self) -> HashMap<String, Vec<Triplet>> {
        self.entries
    }
}

/// A stored document. Rerank stages may annotate `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Create a document with a fresh random id.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), content)
    }

    pub fn with_id(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// A single search intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub query: String,
}

impl Query {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// An ordered batch of queries. Order is kept in the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBatch {
    pub queries: Vec<Query>,
}

impl QueryBatch {
    pub fn new(queries: Vec<Query>) -> Self {
        Self { queries }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.queries.iter().map(|q| q.query.clone()).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for QueryBatch {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Query::new).collect())
    }
}

/// Input accepted by the retriever: one query or a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    Single(Query),
    Batch(QueryBatch),
}

impl QueryInput {
    /// A single query becomes a one-element batch.
    pub fn into_batch(self) -> QueryBatch {
        match self {
            QueryInput::Single(query) => QueryBatch::new(vec![query]),
            QueryInput::Batch(batch) => batch,
        }
    }
}

impl From<Query> for QueryInput {
    fn from(query: Query) -> Self {
        QueryInput::Single(query)
    }
}

impl From<QueryBatch> for QueryInput {
    fn from(batch: QueryBatch) -> Self {
        QueryInput::Batch(batch)
    }
}

impl From<&str> for QueryInput {
    fn from(query: &str) -> Self {
        QueryInput::Single(Query::new(query))
    }
}

/// One (document, distance) hit from a single ANN lookup.
///
/// Lower distance means closer, whatever the configured metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub document_id: String,
    pub distance: f32,
}

impl Candidate {
    pub fn new(document_id: impl Into<String>, distance: f32) -> Self {
        Self {
            document_id: document_id.into(),
            distance,
        }
    }
}

/// The query batch paired with one ranked document list shared by all its queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub queries: QueryBatch,
    pub documents: Vec<Document>,
}

impl RetrievalResult {
    pub fn new(queries: QueryBatch) -> Self {
        Self {
            queries,
            documents: Vec::new(),
        }
    }

    pub fn document_ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.id.as_str()).collect()
    }
}
