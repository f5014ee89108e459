// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::TitleError;
use crate::http::HttpClient;

use super::reference::{ContentKind, ContentReference};

/// Canonical title for a reference, as reported by the metadata endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub title: String,
    pub kind: ContentKind,
}

/// Looks up the canonical title of a podcast reference
#[async_trait]
pub trait TitleResolver: Send + Sync {
    /// Resolve a reference to a non-empty title. Performs one request, no retries.
    async fn resolve(&self, reference: &ContentReference) -> Result<ResolvedTitle, TitleError>;
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    title: Option<String>,
}

/// Title resolver backed by the Spotify oEmbed endpoint
#[derive(Clone)]
pub struct SpotifyTitleResolver<C> {
    client: C,
    endpoint: Url,
}

impl<C: HttpClient> SpotifyTitleResolver<C> {
    pub fn new(client: C, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    fn lookup_url(&self, identifier: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", identifier);
        url
    }
}

#[async_trait]
impl<C: HttpClient> TitleResolver for SpotifyTitleResolver<C> {
    async fn resolve(&self, reference: &ContentReference) -> Result<ResolvedTitle, TitleError> {
        let identifier = reference.identifier();
        let url = self.lookup_url(identifier);

        let response = self
            .client
            .get(&url)
            .await
            .map_err(|e| TitleError::RequestFailed {
                identifier: identifier.to_string(),
                source: e,
            })?;

        if !response.is_success() {
            return Err(TitleError::HttpStatus {
                identifier: identifier.to_string(),
                status: response.status,
            });
        }

        let payload: OEmbedResponse =
            serde_json::from_slice(&response.body).map_err(|e| TitleError::MalformedResponse {
                identifier: identifier.to_string(),
                source: e,
            })?;

        // oEmbed titles come from page metadata and may carry HTML entities
        let title = payload
            .title
            .map(|t| html_escape::decode_html_entities(&t).trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TitleError::MissingTitle {
                identifier: identifier.to_string(),
            })?;

        Ok(ResolvedTitle {
            title,
            kind: reference.kind(),
        })
    }
}
