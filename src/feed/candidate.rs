use std::collections::HashSet;

/// A feed found in the index, keyed by its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCandidate {
    pub feed_url: String,
    pub display_name: String,
}

/// Collapse candidates sharing a feed URL.
///
/// The first occurrence of each URL wins, including its display name, and
/// first-seen order is preserved.
pub fn dedupe_candidates<I>(candidates: I) -> Vec<FeedCandidate>
where
    I: IntoIterator<Item = FeedCandidate>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.feed_url.clone()))
        .collect()
}
