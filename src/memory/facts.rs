//! Fact memory: the triplet store boundary and an in-memory implementation.

use crate::error::Result;
use crate::memory::types::Triplet;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Persistent (subject, predicate, object) facts.
///
/// The relation map builder only relies on `neighbors`. Implementations must
/// return every triplet whose subject equals the argument; the order is theirs
/// to define.
#[async_trait]
pub trait TripletStore: Send + Sync {
    async fn add(&self, triplet: Triplet) -> Result<()>;

    /// Remove an exact-match triplet. Absence is not an error.
    async fn delete(&self, triplet: &Triplet) -> Result<()>;

    async fn neighbors(&self, subject: &str) -> Result<Vec<Triplet>>;

    async fn add_triplet(&self, subject: &str, predicate: &str, object: &str) -> Result<()> {
        self.add(Triplet::new(subject, predicate, object)).await
    }

    async fn delete_triplet(&self, subject: &str, predicate: &str, object: &str) -> Result<()> {
        self.delete(&Triplet::new(subject, predicate, object)).await
    }
}

/// Insertion-ordered triplet set held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTripletStore {
    triplets: RwLock<Vec<Triplet>>,
}

impl InMemoryTripletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.triplets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.triplets.read().await.is_empty()
    }
}

#[async_trait]
impl TripletStore for InMemoryTripletStore {
    async fn add(&self, triplet: Triplet) -> Result<()> {
        let mut triplets = self.triplets.write().await;
        if !triplets.contains(&triplet) {
            triplets.push(triplet);
        }
        Ok(())
    }

    async fn delete(&self, triplet: &Triplet) -> Result<()> {
        self.triplets.write().await.retain(|t| t != triplet);
        Ok(())
    }

    async fn neighbors(&self, subject: &str) -> Result<Vec<Triplet>> {
        Ok(self
            .triplets
            .read()
            .await
            .iter()
            .filter(|t| t.subject == subject)
            .cloned()
            .collect())
    }
}
