//! Mock collaborators for exercising the pipeline without any network.
//!
//! All mocks share state through `Arc<Mutex<_>>` so cloned handles (the
//! engine clones nothing, but tests keep their own handle for assertions)
//! observe the same queues and call counts.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::error::ClassifyError;
use crate::evidence::Evidence;
use crate::models::{
    ArbiterRequest, ArbiterVerdict, ClassificationResult, ListingEntry, PageFeatures,
    RepoFeatures, ResultSource,
};
use crate::traits::{Arbiter, FeatureExtractor, Fetcher};

/// Fetcher that pops queued responses, or serves a placeholder page once
/// the queue is empty.
#[derive(Clone)]
pub struct MockFetcher {
    responses: Arc<Mutex<Vec<Result<String, ClassifyError>>>>,
    calls: Arc<Mutex<u32>>,
}

impl MockFetcher {
    /// Always serves the given HTML.
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    /// Fails the first fetch with the given error.
    pub fn with_error(error: ClassifyError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, ClassifyError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of fetches observed so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, ClassifyError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>placeholder</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

/// Extractor that returns configured features, or defaults when none were
/// queued.
#[derive(Clone, Default)]
pub struct MockExtractor {
    page: Arc<Mutex<Vec<Result<PageFeatures, ClassifyError>>>>,
    repo: Arc<Mutex<Vec<Result<RepoFeatures, ClassifyError>>>>,
    page_calls: Arc<Mutex<u32>>,
    repo_calls: Arc<Mutex<u32>>,
}

impl MockExtractor {
    /// Extractor that yields empty features for every page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(features: PageFeatures) -> Self {
        let extractor = Self::default();
        extractor.page.lock().unwrap().push(Ok(features));
        extractor
    }

    pub fn with_repo(features: RepoFeatures) -> Self {
        let extractor = Self::default();
        extractor.repo.lock().unwrap().push(Ok(features));
        extractor
    }

    pub fn with_page_error(error: ClassifyError) -> Self {
        let extractor = Self::default();
        extractor.page.lock().unwrap().push(Err(error));
        extractor
    }

    pub fn with_repo_error(error: ClassifyError) -> Self {
        let extractor = Self::default();
        extractor.repo.lock().unwrap().push(Err(error));
        extractor
    }

    pub fn page_calls(&self) -> u32 {
        *self.page_calls.lock().unwrap()
    }

    pub fn repo_calls(&self) -> u32 {
        *self.repo_calls.lock().unwrap()
    }
}

impl FeatureExtractor for MockExtractor {
    fn page_features(&self, _html: &str) -> Result<PageFeatures, ClassifyError> {
        *self.page_calls.lock().unwrap() += 1;
        let mut queue = self.page.lock().unwrap();
        if queue.is_empty() {
            Ok(PageFeatures::default())
        } else {
            queue.remove(0)
        }
    }

    fn repo_features(&self, _html: &str) -> Result<RepoFeatures, ClassifyError> {
        *self.repo_calls.lock().unwrap() += 1;
        let mut queue = self.repo.lock().unwrap();
        if queue.is_empty() {
            Ok(RepoFeatures::default())
        } else {
            queue.remove(0)
        }
    }
}

/// Arbiter that replays queued verdicts and records every request.
#[derive(Clone)]
pub struct MockArbiter {
    responses: Arc<Mutex<Vec<Result<ArbiterVerdict, ClassifyError>>>>,
    requests: Arc<Mutex<Vec<ArbiterRequest>>>,
    calls: Arc<Mutex<u32>>,
}

impl MockArbiter {
    pub fn new(verdict: ArbiterVerdict) -> Self {
        Self::with_responses(vec![Ok(verdict)])
    }

    pub fn with_error(error: ClassifyError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<ArbiterVerdict, ClassifyError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ArbiterRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Arbiter for MockArbiter {
    async fn judge(&self, request: &ArbiterRequest) -> Result<ArbiterVerdict, ClassifyError> {
        *self.calls.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(make_verdict(false, 0.0))
        } else {
            responses.remove(0)
        }
    }
}

pub fn make_verdict(is_documentation: bool, confidence: f64) -> ArbiterVerdict {
    ArbiterVerdict {
        is_documentation,
        confidence,
        reasoning: "test verdict".to_string(),
    }
}

/// Page features of a healthy documentation site.
pub fn doc_page_features() -> PageFeatures {
    PageFeatures {
        title: Some("Widget Documentation".to_string()),
        meta_description: Some("Reference manual for the widget toolkit".to_string()),
        first_heading: Some("Getting Started".to_string()),
        headings: vec![
            "Getting Started".to_string(),
            "Installation".to_string(),
            "Configuration".to_string(),
        ],
        has_sidebar: true,
        sidebar_links: vec![
            "Getting Started".to_string(),
            "API Reference".to_string(),
            "Examples".to_string(),
        ],
        code_block_count: 12,
        has_search_box: true,
        has_version_selector: true,
        content_sample: "Install the widget toolkit and configure your first pipeline."
            .to_string(),
        has_last_updated: false,
        has_pagination: false,
    }
}

/// Repository listing with a docs directory, translations, and a usage
/// README.
pub fn doc_repo_features() -> RepoFeatures {
    RepoFeatures {
        entries: vec![
            ListingEntry::directory("docs"),
            ListingEntry::directory("en"),
            ListingEntry::directory("ja"),
            ListingEntry::file("overview.md"),
            ListingEntry::file("install.md"),
            ListingEntry::file("config.md"),
            ListingEntry::file("troubleshooting.md"),
        ],
        readme_sample: "Getting started with the widget toolkit.".to_string(),
    }
}

/// Minimal positive result for cache tests.
pub fn make_test_result(url: &str) -> ClassificationResult {
    ClassificationResult {
        url: url.to_string(),
        is_documentation: true,
        confidence: 0.9,
        source: ResultSource::ContentAnalysis,
        total_score: 40,
        evidence: vec![Evidence::new(40, "test evidence")],
        checked_at: Utc::now(),
    }
}
