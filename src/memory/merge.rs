//! Merging of ANN candidates from one or more lookups.

use crate::memory::types::Candidate;
use std::collections::HashSet;

/// Deduplicate, threshold, sort, and truncate candidates.
///
/// The first occurrence of a document id claims it: later duplicates are
/// dropped whatever their distance, even when the first occurrence itself
/// fails the threshold. Survivors have `distance < max_distance`, are sorted
/// ascending with ties kept in discovery order, and at most `k` are returned.
pub fn merge_candidates<I>(candidates: I, max_distance: f32, k: usize) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut survivors: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.document_id.clone()))
        .filter(|candidate| candidate.distance < max_distance)
        .collect();

    // Stable, so equal distances keep discovery order.
    survivors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    survivors.truncate(k);
    survivors
}
