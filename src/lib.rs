pub mod config;
pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod metadata;
pub mod pipeline;
pub mod progress;

#[cfg(test)]
mod test_helpers;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use episode::{
    DownloadOrchestrator, DownloadOutcome, DownloadTool, DownloadedFile, EpisodeFilter,
    FilterKind, PodcastDlTool, ToolInvocation, build_exact_filter, build_fuzzy_filter,
};
pub use error::{DownloadError, PipelineError, ReferenceError, SearchError, TitleError};
pub use feed::{FeedCandidate, FeedIndexSearcher, ItunesSearcher, dedupe_candidates};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use metadata::{
    ContentKind, ContentReference, ResolvedTitle, SpotifyTitleResolver, TitleResolver,
};
pub use pipeline::{Pipeline, PipelineOutcome, PlanOptions, Resolution, ResolutionPlan};
pub use progress::{
    NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter, TracingReporter,
};

/// Pipeline wired to the production services
pub type DefaultPipeline = Pipeline<
    SpotifyTitleResolver<ReqwestClient>,
    ItunesSearcher<ReqwestClient>,
    PodcastDlTool,
>;

/// Build a pipeline against Spotify oEmbed, iTunes Search and `tool`
pub fn default_pipeline(
    config: &PipelineConfig,
    tool: PodcastDlTool,
    reporter: SharedProgressReporter,
) -> Result<DefaultPipeline, reqwest::Error> {
    let client = ReqwestClient::from_config(config)?;
    let resolver = SpotifyTitleResolver::new(client.clone(), config.metadata_endpoint.clone());
    let searcher = ItunesSearcher::new(client, config.search_endpoint.clone(), config.search_limit);
    let tool = tool
        .with_timeout(config.tool_timeout)
        .with_output_limit(config.tool_output_limit);

    Ok(Pipeline::new(
        resolver,
        searcher,
        DownloadOrchestrator::new(tool, config),
        reporter,
    ))
}
