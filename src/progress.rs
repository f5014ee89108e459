use std::path::PathBuf;
use std::sync::Arc;

use crate::episode::FilterKind;
use crate::metadata::ContentKind;

/// Events emitted while resolving and downloading a podcast reference
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Title lookup is starting
    ResolvingTitle { identifier: String },

    /// Title lookup succeeded
    TitleResolved { title: String, kind: ContentKind },

    /// Feed index is being queried
    SearchingFeeds { query: String, kind: ContentKind },

    /// A feed was chosen from the deduplicated candidates
    FeedSelected {
        display_name: String,
        feed_url: String,
        /// Number of distinct candidates the index returned
        candidate_count: usize,
    },

    /// A download attempt is starting
    DownloadStarting {
        /// Filter tier in use; None when the whole feed is downloaded
        filter: Option<FilterKind>,
        pattern: Option<String>,
    },

    /// A download attempt failed
    DownloadFailed {
        filter: Option<FilterKind>,
        error: String,
        /// True when the tool ran but produced no audio
        no_audio: bool,
    },

    /// Audio file was verified on disk
    DownloadCompleted { file_path: PathBuf },

    /// Resolution ended without a verified audio file
    ResolutionFailed { error: String },
}

/// Trait for reporting progress events during resolution.
///
/// Implementations can use this to display spinners, log messages,
/// or record events for assertions.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Forwards every event to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::DownloadFailed { .. } | ProgressEvent::ResolutionFailed { .. } => {
                tracing::warn!(?event, "progress");
            }
            _ => tracing::info!(?event, "progress"),
        }
    }
}
