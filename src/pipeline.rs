// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::episode::{
    DownloadOrchestrator, DownloadTool, DownloadedFile, EpisodeFilter, build_exact_filter,
    build_fuzzy_filter,
};
use crate::error::{DownloadError, PipelineError};
use crate::feed::{FeedCandidate, FeedIndexSearcher};
use crate::metadata::{ContentKind, ContentReference, ResolvedTitle, TitleResolver};
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Knobs for the resolution stage
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Show name searched for instead of the resolved title
    pub show_name: Option<String>,
}

/// Title and feed resolution for a reference, without downloading anything
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    reference: ContentReference,
    title: ResolvedTitle,
    /// Deduplicated candidates in index order; never empty
    candidates: Vec<FeedCandidate>,
    selected: FeedCandidate,
    /// Filter for the first download attempt; None for shows
    filter: Option<EpisodeFilter>,
}

impl ResolutionPlan {
    pub fn reference(&self) -> &ContentReference {
        &self.reference
    }

    pub fn title(&self) -> &ResolvedTitle {
        &self.title
    }

    /// All distinct feeds the index returned, in index order
    pub fn candidates(&self) -> &[FeedCandidate] {
        &self.candidates
    }

    pub fn filter(&self) -> Option<&EpisodeFilter> {
        self.filter.as_ref()
    }

    /// The feed the pipeline downloads from; the first candidate unless another was chosen
    pub fn selected(&self) -> &FeedCandidate {
        &self.selected
    }

    /// Download from the candidate at `index` instead. Returns None when out of range.
    pub fn choose(&mut self, index: usize) -> Option<&FeedCandidate> {
        let candidate = self.candidates.get(index)?;
        self.selected = candidate.clone();
        Some(&self.selected)
    }
}

/// A reference resolved all the way to an audio file on disk
#[derive(Debug, Clone)]
pub struct Resolution {
    pub title: String,
    pub kind: ContentKind,
    pub feed: FeedCandidate,
    /// Filter of the attempt that succeeded; None for whole-feed downloads
    pub filter: Option<EpisodeFilter>,
    pub file: DownloadedFile,
}

/// Uniform success/failure record for one reference
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub reference: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineOutcome {
    pub fn from_result(reference: &str, result: &Result<Resolution, PipelineError>) -> Self {
        match result {
            Ok(resolution) => Self {
                reference: reference.to_string(),
                success: true,
                feed_name: Some(resolution.feed.display_name.clone()),
                title: Some(resolution.title.clone()),
                feed_url: Some(resolution.feed.feed_url.clone()),
                file_path: Some(resolution.file.path.clone()),
                file_name: Some(resolution.file.file_name.clone()),
                error: None,
            },
            Err(e) => Self::failure(reference, e.to_string()),
        }
    }

    /// Failure record for a reference that never reached the pipeline
    pub fn failure(reference: &str, error: String) -> Self {
        Self {
            reference: reference.to_string(),
            success: false,
            feed_name: None,
            title: None,
            feed_url: None,
            file_path: None,
            file_name: None,
            error: Some(error),
        }
    }
}

/// Resolves a reference to a feed and downloads the matching audio.
///
/// Each stage runs sequentially. For episodes a failed exact-title download
/// is retried once with a fuzzy filter; shows get a single whole-feed attempt.
pub struct Pipeline<R, S, T> {
    resolver: R,
    searcher: S,
    downloader: DownloadOrchestrator<T>,
    reporter: SharedProgressReporter,
}

impl<R, S, T> Pipeline<R, S, T>
where
    R: TitleResolver,
    S: FeedIndexSearcher,
    T: DownloadTool,
{
    pub fn new(
        resolver: R,
        searcher: S,
        downloader: DownloadOrchestrator<T>,
        reporter: SharedProgressReporter,
    ) -> Self {
        Self {
            resolver,
            searcher,
            downloader,
            reporter,
        }
    }

    /// Resolve the title and feed candidates without downloading
    pub async fn plan(
        &self,
        reference: &ContentReference,
    ) -> Result<ResolutionPlan, PipelineError> {
        self.plan_with(reference, &PlanOptions::default()).await
    }

    /// Like [`Pipeline::plan`], with explicit options
    pub async fn plan_with(
        &self,
        reference: &ContentReference,
        options: &PlanOptions,
    ) -> Result<ResolutionPlan, PipelineError> {
        let result = self.build_plan(reference, options).await;
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    /// Resolve `reference` and download its audio into `output_dir`
    pub async fn run(
        &self,
        reference: &ContentReference,
        output_dir: &Path,
    ) -> Result<Resolution, PipelineError> {
        self.run_with(reference, output_dir, &PlanOptions::default())
            .await
    }

    /// Like [`Pipeline::run`], with explicit options
    pub async fn run_with(
        &self,
        reference: &ContentReference,
        output_dir: &Path,
        options: &PlanOptions,
    ) -> Result<Resolution, PipelineError> {
        let result = match self.build_plan(reference, options).await {
            Ok(plan) => self.execute(plan, output_dir).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    /// Download the audio for an existing plan, from its selected feed
    pub async fn fetch(
        &self,
        plan: ResolutionPlan,
        output_dir: &Path,
    ) -> Result<Resolution, PipelineError> {
        let result = self.execute(plan, output_dir).await;
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    async fn build_plan(
        &self,
        reference: &ContentReference,
        options: &PlanOptions,
    ) -> Result<ResolutionPlan, PipelineError> {
        self.reporter.report(ProgressEvent::ResolvingTitle {
            identifier: reference.identifier().to_string(),
        });

        let title = self
            .resolver
            .resolve(reference)
            .await
            .map_err(PipelineError::MetadataNotFound)?;

        self.reporter.report(ProgressEvent::TitleResolved {
            title: title.title.clone(),
            kind: title.kind,
        });

        // A show name override searches the index for the show itself
        let (query, search_kind) = match options.show_name.as_deref().map(str::trim) {
            Some(show) if !show.is_empty() => (show.to_string(), ContentKind::Show),
            _ => (title.title.clone(), title.kind),
        };

        self.reporter.report(ProgressEvent::SearchingFeeds {
            query: query.clone(),
            kind: search_kind,
        });

        let candidates = self
            .searcher
            .search(&query, search_kind)
            .await
            .map_err(|e| PipelineError::FeedNotFound(Some(e)))?;

        let Some(selected) = candidates.first().cloned() else {
            return Err(PipelineError::FeedNotFound(None));
        };

        let filter = match title.kind {
            ContentKind::Episode => Some(build_exact_filter(&title.title)),
            ContentKind::Show => None,
        };

        Ok(ResolutionPlan {
            reference: reference.clone(),
            title,
            candidates,
            selected,
            filter,
        })
    }

    async fn execute(
        &self,
        plan: ResolutionPlan,
        output_dir: &Path,
    ) -> Result<Resolution, PipelineError> {
        let ResolutionPlan {
            title,
            candidates,
            selected: feed,
            filter,
            ..
        } = plan;

        self.reporter.report(ProgressEvent::FeedSelected {
            display_name: feed.display_name.clone(),
            feed_url: feed.feed_url.clone(),
            candidate_count: candidates.len(),
        });

        let first = self
            .attempt(&feed.feed_url, output_dir, filter.as_ref())
            .await;

        let (filter, outcome) = match (first, title.kind) {
            (Ok(file), _) => (filter, Ok(file)),
            (Err(e), ContentKind::Show) => (filter, Err(e)),
            (Err(e), ContentKind::Episode) => match build_fuzzy_filter(&title.title) {
                Some(fuzzy) => {
                    let retry = self.attempt(&feed.feed_url, output_dir, Some(&fuzzy)).await;
                    (Some(fuzzy), retry)
                }
                None => {
                    tracing::debug!(title = %title.title, "no fuzzy filter buildable");
                    (filter, Err(e))
                }
            },
        };

        let file = outcome?;
        Ok(Resolution {
            title: title.title,
            kind: title.kind,
            feed,
            filter,
            file,
        })
    }

    async fn attempt(
        &self,
        feed_url: &str,
        output_dir: &Path,
        filter: Option<&EpisodeFilter>,
    ) -> Result<DownloadedFile, DownloadError> {
        let kind = filter.map(EpisodeFilter::kind);

        self.reporter.report(ProgressEvent::DownloadStarting {
            filter: kind,
            pattern: filter.map(|f| f.pattern().to_string()),
        });

        match self.downloader.download(feed_url, output_dir, filter).await {
            Ok(file) => {
                self.reporter.report(ProgressEvent::DownloadCompleted {
                    file_path: file.path.clone(),
                });
                Ok(file)
            }
            Err(e) => {
                self.reporter.report(ProgressEvent::DownloadFailed {
                    filter: kind,
                    error: e.to_string(),
                    no_audio: e.is_no_audio(),
                });
                Err(e)
            }
        }
    }

    fn report_failure(&self, error: &PipelineError) {
        self.reporter.report(ProgressEvent::ResolutionFailed {
            error: error.to_string(),
        });
    }
}
