//! Memory storage and retrieval: fact memory traversal and vector document search.

pub mod embedding;
pub mod facts;
pub mod index;
pub mod merge;
pub mod relation;
pub mod search;
pub mod sqlite;
pub mod types;

pub use embedding::{
    cosine_similarity, euclidean_distance, EmbeddingModel, EmbeddingProvider, FakeEmbeddings,
};
pub use facts::{InMemoryTripletStore, TripletStore};
pub use index::{DistanceMetric, DocumentStore, InMemoryDocumentIndex, VectorIndex};
pub use merge::merge_candidates;
pub use relation::RelationMapBuilder;
pub use search::{DocumentRetriever, Reranker, RetrieverConfig};
pub use sqlite::SqliteTripletStore;
pub use types::{
    Candidate, Document, Query, QueryBatch, QueryInput, RelationMap, RetrievalResult, Triplet,
};
