//! Shared mocks for unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::episode::{DownloadTool, ToolInvocation, ToolOutput};
use crate::error::{DownloadError, SearchError, TitleError};
use crate::feed::{FeedCandidate, FeedIndexSearcher, dedupe_candidates};
use crate::http::{HttpClient, HttpResponse};
use crate::metadata::{ContentKind, ContentReference, ResolvedTitle, TitleResolver};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Reporter that keeps every event for later assertions
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// HTTP client returning one canned response and recording request URLs
#[derive(Clone)]
pub struct MockHttpClient {
    status: u16,
    body: Bytes,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl MockHttpClient {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: Bytes::from(body.to_string()),
            requests: Arc::default(),
        }
    }

    pub fn requested_urls(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse, reqwest::Error> {
        self.requests.lock().unwrap().push(url.clone());
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Title resolver returning a fixed title, or failing
pub struct MockTitleResolver {
    title: Option<String>,
}

impl MockTitleResolver {
    pub fn title(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
        }
    }

    pub fn missing() -> Self {
        Self { title: None }
    }
}

#[async_trait]
impl TitleResolver for MockTitleResolver {
    async fn resolve(&self, reference: &ContentReference) -> Result<ResolvedTitle, TitleError> {
        match &self.title {
            Some(title) => Ok(ResolvedTitle {
                title: title.clone(),
                kind: reference.kind(),
            }),
            None => Err(TitleError::MissingTitle {
                identifier: reference.identifier().to_string(),
            }),
        }
    }
}

/// Feed searcher returning canned records, deduplicated like the real one
#[derive(Clone)]
pub struct MockSearcher {
    results: Option<Vec<FeedCandidate>>,
    queries: Arc<Mutex<Vec<(String, ContentKind)>>>,
}

impl MockSearcher {
    pub fn with_results(results: Vec<(&str, &str)>) -> Self {
        let results = results
            .into_iter()
            .map(|(feed_url, display_name)| FeedCandidate {
                feed_url: feed_url.to_string(),
                display_name: display_name.to_string(),
            })
            .collect();
        Self {
            results: Some(results),
            queries: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            results: None,
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<(String, ContentKind)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedIndexSearcher for MockSearcher {
    async fn search(
        &self,
        query: &str,
        kind: ContentKind,
    ) -> Result<Vec<FeedCandidate>, SearchError> {
        self.queries.lock().unwrap().push((query.to_string(), kind));
        match &self.results {
            Some(results) => Ok(dedupe_candidates(results.clone())),
            None => Err(SearchError::HttpStatus {
                query: query.to_string(),
                status: 500,
            }),
        }
    }
}

/// What the mock download tool does on one call
#[derive(Debug, Clone)]
pub enum ToolBehavior {
    /// Exit zero after writing these files into the output directory
    Write(Vec<&'static str>),
    /// Like `Write`, with modification times in seconds after the epoch
    WriteAged(Vec<(&'static str, u64)>),
    /// Exit zero without writing anything
    Succeed,
    /// Exit non-zero
    Fail,
}

/// Download tool replaying scripted behaviors; extra calls just succeed
#[derive(Clone)]
pub struct MockDownloadTool {
    behaviors: Arc<Mutex<VecDeque<ToolBehavior>>>,
    invocations: Arc<Mutex<Vec<ToolInvocation>>>,
}

impl MockDownloadTool {
    pub fn new(behaviors: Vec<ToolBehavior>) -> Self {
        Self {
            behaviors: Arc::new(Mutex::new(behaviors.into())),
            invocations: Arc::default(),
        }
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadTool for MockDownloadTool {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DownloadError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ToolBehavior::Succeed);

        match behavior {
            ToolBehavior::Write(names) => {
                for name in names {
                    std::fs::write(invocation.output_dir.join(name), b"audio").unwrap();
                }
            }
            ToolBehavior::WriteAged(files) => {
                for (name, secs) in files {
                    let path = invocation.output_dir.join(name);
                    std::fs::write(&path, b"audio").unwrap();
                    std::fs::File::options()
                        .write(true)
                        .open(&path)
                        .unwrap()
                        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
                        .unwrap();
                }
            }
            ToolBehavior::Succeed => {}
            ToolBehavior::Fail => {
                return Err(DownloadError::ToolFailed {
                    status: "exit status: 1".to_string(),
                    stderr: "episode not found".to_string(),
                });
            }
        }

        Ok(ToolOutput::default())
    }
}
