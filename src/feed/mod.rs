mod candidate;
mod search;

pub use candidate::{FeedCandidate, dedupe_candidates};
pub use search::{FeedIndexSearcher, ItunesSearcher};
