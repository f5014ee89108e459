// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use url::Url;

/// Spotify oEmbed endpoint used for title lookups
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://open.spotify.com/oembed";

/// iTunes Search API endpoint used to find feeds
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://itunes.apple.com/search";

/// Maximum number of records requested from the feed index
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Hard bound on one run of the download tool
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Maximum bytes captured from each of the tool's stdout and stderr
pub const DEFAULT_TOOL_OUTPUT_LIMIT: usize = 50 * 1024 * 1024;

/// Options for the resolution pipeline and its collaborators
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Metadata (oEmbed) endpoint
    pub metadata_endpoint: Url,
    /// Feed index search endpoint
    pub search_endpoint: Url,
    /// Result cap sent to the feed index
    pub search_limit: usize,
    /// Timeout for each HTTP request
    pub http_timeout: Duration,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Timeout for one download tool invocation
    pub tool_timeout: Duration,
    /// Output buffer cap for one download tool invocation
    pub tool_output_limit: usize,
    /// Naming template handed to the download tool
    pub episode_template: String,
    /// File extensions recognized as audio (lowercase, no dot)
    pub audio_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metadata_endpoint: Url::parse(DEFAULT_METADATA_ENDPOINT)
                .expect("default metadata endpoint is a valid URL"),
            search_endpoint: Url::parse(DEFAULT_SEARCH_ENDPOINT)
                .expect("default search endpoint is a valid URL"),
            search_limit: DEFAULT_SEARCH_LIMIT,
            http_timeout: Duration::from_secs(30),
            user_agent: concat!("podbridge/", env!("CARGO_PKG_VERSION")).to_string(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            tool_output_limit: DEFAULT_TOOL_OUTPUT_LIMIT,
            episode_template: "{{title}}".to_string(),
            audio_extensions: vec!["mp3".to_string(), "m4a".to_string(), "wav".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Check whether a file extension is on the audio allow-list
    pub fn is_audio_extension(&self, ext: &str) -> bool {
        self.audio_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}
