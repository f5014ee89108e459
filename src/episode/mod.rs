mod artifact;
mod download;
mod filter;
mod tool;

pub use artifact::{find_latest_audio, list_audio_files};
pub use download::{DownloadOrchestrator, DownloadOutcome, DownloadedFile};
pub use filter::{
    EpisodeFilter, FilterKind, build_exact_filter, build_fuzzy_filter, escape_pattern,
};
pub use tool::{DownloadTool, PodcastDlTool, ToolInvocation, ToolOutput};
