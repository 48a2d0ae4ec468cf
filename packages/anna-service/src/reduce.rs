use std::collections::HashSet;

use anna_config::MAX_SEARCH_TOP_K;

use crate::hit::Hit;

/// Drops repeated `(document, page)` hits, orders the rest by score and keeps the best `limit`.
///
/// The first occurrence of a key wins, so callers control tie-breaking through input order.
/// Sorting is stable and happens before truncation. `limit` is clamped to the search ceiling.
pub fn dedup_rank(hits: Vec<Hit>, limit: usize) -> Vec<Hit> {
	let mut seen = HashSet::with_capacity(hits.len());
	let mut kept: Vec<Hit> = hits.into_iter().filter(|hit| seen.insert(hit.dedup_key())).collect();

	kept.sort_by(|a, b| b.score.total_cmp(&a.score));
	kept.truncate(limit.min(MAX_SEARCH_TOP_K as usize));

	kept
}
