//! Bounded multi-hop expansion of seed subjects into a relation map.

use crate::error::{Error, Result};
use crate::memory::facts::TripletStore;
use crate::memory::types::{RelationMap, Triplet};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Builds relation maps by breadth-first traversal over a triplet store.
///
/// Seeds are exhausted one at a time, in the order given. Within a seed the
/// walk proceeds hop level by hop level. Every triplet leaving an expanded
/// node is collected; the per-seed visited set only stops a node from being
/// expanded twice, so cycles terminate.
#[derive(Clone)]
pub struct RelationMapBuilder {
    store: Arc<dyn TripletStore>,
}

impl std::fmt::Debug for RelationMapBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationMapBuilder").finish_non_exhaustive()
    }
}

impl RelationMapBuilder {
    pub fn new(store: Arc<dyn TripletStore>) -> Self {
        Self { store }
    }

    /// Expand `subjects` up to `depth` hops, collecting at most `limit`
    /// triplets across all subjects.
    ///
    /// Every distinct subject gets an entry, even when nothing is reachable.
    /// Once `limit` triplets are collected no further store queries are made.
    /// The map is marked truncated only if a fetched triplet was dropped.
    pub async fn build<S: AsRef<str>>(
        &self,
        subjects: &[S],
        depth: usize,
        limit: usize,
    ) -> Result<RelationMap> {
        if limit == 0 {
            return Err(Error::invalid("relation map limit must be positive"));
        }

        let mut entries: HashMap<String, Vec<Triplet>> = HashMap::with_capacity(subjects.len());
        let mut seeds: Vec<&str> = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let subject = subject.as_ref();
            if !entries.contains_key(subject) {
                entries.insert(subject.to_string(), Vec::new());
                seeds.push(subject);
            }
        }

        let mut total = 0usize;
        let mut truncated = false;

        'seeds: for seed in seeds.iter().copied() {
            if depth == 0 {
                break;
            }

            let mut visited: HashSet<String> = HashSet::from([seed.to_string()]);
            let mut frontier: VecDeque<(String, usize)> = VecDeque::from([(seed.to_string(), 0)]);
            let mut collected: Vec<Triplet> = Vec::new();

            while let Some((node, hops)) = frontier.pop_front() {
                if hops >= depth {
                    continue;
                }
                if total >= limit {
                    entries.insert(seed.to_string(), collected);
                    break 'seeds;
                }

                for triplet in self.store.neighbors(&node).await? {
                    if total >= limit {
                        truncated = true;
                        break;
                    }
                    if visited.insert(triplet.object.clone()) {
                        frontier.push_back((triplet.object.clone(), hops + 1));
                    }
                    collected.push(triplet);
                    total += 1;
                }
            }

            entries.insert(seed.to_string(), collected);
        }

        tracing::debug!(
            seeds = seeds.len(),
            depth,
            limit,
            total,
            truncated,
            "relation map built"
        );

        Ok(RelationMap::from_entries(entries, truncated))
    }
}
