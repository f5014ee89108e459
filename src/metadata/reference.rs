// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use crate::error::ReferenceError;

/// Whether a reference points at a single episode or a whole show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Episode,
    Show,
}

impl ContentKind {
    /// Classify an identifier by its `/episode/` path segment
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.contains("/episode/") {
            ContentKind::Episode
        } else {
            ContentKind::Show
        }
    }

    /// Entity value understood by the feed index
    pub fn search_entity(self) -> &'static str {
        match self {
            ContentKind::Episode => "podcastEpisode",
            ContentKind::Show => "podcast",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Episode => f.write_str("episode"),
            ContentKind::Show => f.write_str("show"),
        }
    }
}

/// A user-supplied podcast reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    identifier: String,
    kind: ContentKind,
}

impl ContentReference {
    /// Parse a Spotify URL or `spotify:<kind>:<id>` URI.
    ///
    /// URIs are rewritten to their `open.spotify.com` URL so the metadata
    /// endpoint always receives a URL. Anything else is kept verbatim.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let identifier = match trimmed.strip_prefix("spotify:") {
            Some(rest) => uri_to_url(rest)
                .ok_or_else(|| ReferenceError::UnsupportedUri(trimmed.to_string()))?,
            None => trimmed.to_string(),
        };

        let kind = ContentKind::from_identifier(&identifier);
        Ok(Self { identifier, kind })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }
}

fn uri_to_url(rest: &str) -> Option<String> {
    let (kind, id) = rest.split_once(':')?;
    if id.is_empty() || id.contains(':') {
        return None;
    }
    match kind {
        "episode" | "show" => Some(format!("https://open.spotify.com/{kind}/{id}")),
        _ => None,
    }
}
