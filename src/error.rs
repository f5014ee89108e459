// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when parsing user input into a content reference
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Podcast reference is empty")]
    Empty,

    #[error("Unsupported Spotify URI '{0}'")]
    UnsupportedUri(String),
}

/// Errors that can occur when looking up a title on the metadata endpoint
#[derive(Error, Debug)]
pub enum TitleError {
    #[error("Metadata request for {identifier} failed: {source}")]
    RequestFailed {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Metadata endpoint returned HTTP {status} for {identifier}")]
    HttpStatus { identifier: String, status: u16 },

    #[error("Malformed metadata response for {identifier}: {source}")]
    MalformedResponse {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Metadata response for {identifier} has no title")]
    MissingTitle { identifier: String },
}

/// Errors that can occur when querying the feed index
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Feed search for '{query}' failed: {source}")]
    RequestFailed {
        query: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Feed index returned HTTP {status} for '{query}'")]
    HttpStatus { query: String, status: u16 },

    #[error("Malformed feed index response for '{query}': {source}")]
    MalformedResponse {
        query: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur during a single download attempt
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running download tool: {0}")]
    ToolIo(#[source] std::io::Error),

    #[error("Download tool exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("Download tool timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("Download tool produced more than {limit} bytes of output")]
    OutputLimitExceeded { limit: usize },

    #[error("No audio files found in {0}")]
    NoAudioProduced(PathBuf),
}

impl DownloadError {
    /// True when the tool ran fine but nothing usable appeared on disk
    pub fn is_no_audio(&self) -> bool {
        matches!(self, DownloadError::NoAudioProduced(_))
    }
}

/// Top-level errors for a resolve-then-fetch run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not fetch podcast info")]
    MetadataNotFound(#[source] TitleError),

    #[error("Could not find RSS feed")]
    FeedNotFound(#[source] Option<SearchError>),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),
}
