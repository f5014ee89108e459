use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::DownloadError;

use super::artifact::list_audio_files;
use super::filter::EpisodeFilter;
use super::tool::{DownloadTool, ToolInvocation};

/// Prefix of the per-attempt staging directory inside the output directory
const STAGING_PREFIX: &str = ".podbridge-";

/// An audio file verified to exist after a download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Newest audio file the attempt produced
    pub path: PathBuf,
    pub file_name: String,
    /// Every audio file placed in the output directory, oldest first
    pub placed: Vec<PathBuf>,
}

/// Result of one download attempt
pub type DownloadOutcome = Result<DownloadedFile, DownloadError>;

/// Runs the download tool against a feed and locates the audio it produced
pub struct DownloadOrchestrator<T> {
    tool: T,
    episode_template: String,
    audio_extensions: Vec<String>,
}

impl<T: DownloadTool> DownloadOrchestrator<T> {
    pub fn new(tool: T, config: &PipelineConfig) -> Self {
        Self {
            tool,
            episode_template: config.episode_template.clone(),
            audio_extensions: config.audio_extensions.clone(),
        }
    }

    /// Download from `feed_url` into `output_dir`, optionally restricted by `filter`.
    ///
    /// The tool writes into a fresh staging directory inside `output_dir`, so
    /// files left over from earlier runs never count as this attempt's result.
    /// Every audio file it produced is moved up into `output_dir`, the newest
    /// one is reported, and the staging directory is removed.
    pub async fn download(
        &self,
        feed_url: &str,
        output_dir: &Path,
        filter: Option<&EpisodeFilter>,
    ) -> DownloadOutcome {
        std::fs::create_dir_all(output_dir).map_err(|e| DownloadError::CreateDirectoryFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(output_dir)
            .map_err(|e| DownloadError::CreateDirectoryFailed {
                path: output_dir.to_path_buf(),
                source: e,
            })?;

        let invocation = ToolInvocation {
            feed_url: feed_url.to_string(),
            output_dir: staging.path().to_path_buf(),
            episode_template: self.episode_template.clone(),
            episode_regex: filter.map(|f| f.pattern().to_string()),
        };

        let result = self.collect(&invocation, output_dir).await;

        let staging_path = staging.path().to_path_buf();
        if let Err(e) = staging.close() {
            tracing::warn!(
                path = %staging_path.display(),
                error = %e,
                "failed to remove staging directory"
            );
        }

        result
    }

    async fn collect(&self, invocation: &ToolInvocation, output_dir: &Path) -> DownloadOutcome {
        self.tool.run(invocation).await?;

        let produced = list_audio_files(&invocation.output_dir, &self.audio_extensions)?;
        if produced.is_empty() {
            return Err(DownloadError::NoAudioProduced(output_dir.to_path_buf()));
        }

        let mut placed = Vec::with_capacity(produced.len());
        for found in produced {
            placed.push(place_file(&found, output_dir)?);
        }

        let path = placed
            .last()
            .cloned()
            .ok_or_else(|| DownloadError::NoAudioProduced(output_dir.to_path_buf()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(DownloadedFile {
            path,
            file_name,
            placed,
        })
    }
}

/// Move `found` into `output_dir` under a sanitized name, replacing any file already there
fn place_file(found: &Path, output_dir: &Path) -> Result<PathBuf, DownloadError> {
    let original_name = found
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let destination = output_dir.join(sanitize_filename::sanitize(&original_name));

    if destination.exists() {
        tracing::debug!(path = %destination.display(), "replacing existing file");
    }
    std::fs::rename(found, &destination).map_err(|e| DownloadError::MoveFailed {
        from: found.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    Ok(destination)
}
