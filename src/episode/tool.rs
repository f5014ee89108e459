// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::config::{DEFAULT_TOOL_OUTPUT_LIMIT, DEFAULT_TOOL_TIMEOUT};
use crate::error::DownloadError;

/// Number of trailing stderr lines kept in failure messages
const STDERR_TAIL_LINES: usize = 10;

/// One request to the external download tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub feed_url: String,
    pub output_dir: PathBuf,
    pub episode_template: String,
    /// Episode regex; None downloads the whole feed
    pub episode_regex: Option<String>,
}

impl ToolInvocation {
    /// Argument vector for `podcast-dl`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--url".into(),
            self.feed_url.clone().into(),
            "--out-dir".into(),
            self.output_dir.clone().into_os_string(),
            "--episode-template".into(),
            self.episode_template.clone().into(),
        ];
        if let Some(regex) = &self.episode_regex {
            args.push("--episode-regex".into());
            args.push(regex.clone().into());
        }
        args
    }
}

/// Captured output of a successful tool run
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// External program that downloads feed episodes into a directory
#[async_trait]
pub trait DownloadTool: Send + Sync {
    /// Run the tool once. Non-zero exit, timeout and output overrun are errors.
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DownloadError>;
}

/// Runs `podcast-dl` as a subprocess
#[derive(Debug, Clone)]
pub struct PodcastDlTool {
    program: PathBuf,
    base_args: Vec<OsString>,
    timeout: Duration,
    output_limit: usize,
}

impl PodcastDlTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
            output_limit: DEFAULT_TOOL_OUTPUT_LIMIT,
        }
    }

    /// Locate `podcast-dl` on PATH, falling back to running it through `npx`
    pub fn from_path() -> Option<Self> {
        if let Ok(path) = which::which("podcast-dl") {
            return Some(Self::new(path));
        }
        which::which("npx")
            .ok()
            .map(|npx| Self::new(npx).with_base_args(["--yes", "podcast-dl"]))
    }

    /// Arguments placed before the invocation's own arguments
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

#[async_trait]
impl DownloadTool for PodcastDlTool {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DownloadError> {
        let args = invocation.args();
        tracing::debug!(
            program = %self.program.display(),
            base_args = ?self.base_args,
            ?args,
            "spawning download tool"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers it forks (npx -> node) can be killed with it
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| DownloadError::Spawn {
            program: self.program.display().to_string(),
            source: e,
        })?;
        let mut group = ProcessGroup::of(&child);

        let collected = tokio::time::timeout(
            self.timeout,
            collect_output(&mut child, self.output_limit),
        )
        .await;

        let (stdout, stderr, status) = match collected {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                group.kill();
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "download tool timed out, killing it");
                group.kill();
                let _ = child.kill().await;
                return Err(DownloadError::TimedOut(self.timeout));
            }
        };
        group.disarm();

        tracing::debug!(%status, "download tool exited");

        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        if !status.success() {
            return Err(DownloadError::ToolFailed {
                status: status.to_string(),
                stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
            });
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
        })
    }
}

/// Process group of a spawned tool, killed when dropped unless disarmed.
///
/// Covers the case where the run future itself is dropped, e.g. on Ctrl-C.
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    id: Option<u32>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self { id: child.id() }
    }

    /// SIGKILL every process in the group
    fn kill(&mut self) {
        #[cfg(unix)]
        if let Some(id) = self.id.take() {
            // SAFETY: killpg only sends a signal and touches no memory. The
            // group id equals the tool's pid because it was spawned with
            // process_group(0).
            let rc = unsafe { libc::killpg(id as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                tracing::debug!(
                    group = id,
                    error = %std::io::Error::last_os_error(),
                    "failed to signal download tool process group"
                );
            }
        }
    }

    /// The tool exited normally; leave the group alone
    fn disarm(&mut self) {
        self.id = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Drain both pipes and wait for exit. Either pipe exceeding `limit` aborts.
async fn collect_output(
    child: &mut Child,
    limit: usize,
) -> Result<(Vec<u8>, Vec<u8>, ExitStatus), DownloadError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    tokio::try_join!(
        read_bounded(stdout, limit),
        read_bounded(stderr, limit),
        async { child.wait().await.map_err(DownloadError::ToolIo) },
    )
}

async fn read_bounded<R>(reader: Option<R>, limit: usize) -> Result<Vec<u8>, DownloadError>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .await
        .map_err(DownloadError::ToolIo)?;

    if buf.len() > limit {
        return Err(DownloadError::OutputLimitExceeded { limit });
    }
    Ok(buf)
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
