// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::SearchError;
use crate::http::HttpClient;
use crate::metadata::ContentKind;

use super::candidate::{FeedCandidate, dedupe_candidates};

/// Searches a podcast index for feeds matching a title
#[async_trait]
pub trait FeedIndexSearcher: Send + Sync {
    /// Return deduplicated candidates in index order.
    ///
    /// An empty result is a normal "no match", not an error.
    async fn search(&self, query: &str, kind: ContentKind)
    -> Result<Vec<FeedCandidate>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRecord {
    feed_url: Option<String>,
    collection_name: Option<String>,
    track_name: Option<String>,
}

impl SearchRecord {
    fn into_candidate(self) -> Option<FeedCandidate> {
        let feed_url = self.feed_url.filter(|u| !u.trim().is_empty())?;
        let display_name = self
            .collection_name
            .or(self.track_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| feed_url.clone());

        Some(FeedCandidate {
            feed_url,
            display_name,
        })
    }
}

/// Feed searcher backed by the iTunes Search API
#[derive(Clone)]
pub struct ItunesSearcher<C> {
    client: C,
    endpoint: Url,
    limit: usize,
}

impl<C: HttpClient> ItunesSearcher<C> {
    pub fn new(client: C, endpoint: Url, limit: usize) -> Self {
        Self {
            client,
            endpoint,
            limit,
        }
    }

    fn search_url(&self, query: &str, kind: ContentKind) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("term", query)
            .append_pair("media", "podcast")
            .append_pair("entity", kind.search_entity())
            .append_pair("limit", &self.limit.to_string());
        url
    }
}

#[async_trait]
impl<C: HttpClient> FeedIndexSearcher for ItunesSearcher<C> {
    async fn search(
        &self,
        query: &str,
        kind: ContentKind,
    ) -> Result<Vec<FeedCandidate>, SearchError> {
        let url = self.search_url(query, kind);

        let response = self
            .client
            .get(&url)
            .await
            .map_err(|e| SearchError::RequestFailed {
                query: query.to_string(),
                source: e,
            })?;

        if !response.is_success() {
            return Err(SearchError::HttpStatus {
                query: query.to_string(),
                status: response.status,
            });
        }

        let payload: SearchResponse =
            serde_json::from_slice(&response.body).map_err(|e| SearchError::MalformedResponse {
                query: query.to_string(),
                source: e,
            })?;

        let total = payload.results.len();
        let candidates = dedupe_candidates(
            payload
                .results
                .into_iter()
                .filter_map(SearchRecord::into_candidate),
        );

        tracing::debug!(query, total, distinct = candidates.len(), "feed index results");

        Ok(candidates)
    }
}
