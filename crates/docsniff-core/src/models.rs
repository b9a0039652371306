use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;

/// Coarse URL category, decided once per classification run.
///
/// The category selects which feature extractor runs against the fetched
/// content and how the arbiter prompt frames the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlCategory {
    /// URL on a known code-hosting platform: repository pages, wikis,
    /// file views, and generated pages sites.
    RepositoryListing,
    /// Any other web page, treated as a candidate documentation site.
    DedicatedDocSite,
}

impl UrlCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlCategory::RepositoryListing => "repository listing",
            UrlCategory::DedicatedDocSite => "dedicated site",
        }
    }
}

impl fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Code-hosting platform recognized from the hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoPlatform {
    GitHub,
    GitLab,
    Bitbucket,
}

impl RepoPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoPlatform::GitHub => "github",
            RepoPlatform::GitLab => "gitlab",
            RepoPlatform::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for RepoPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repository coordinates parsed from a code-hosting URL.
///
/// Derived purely from URL shape, never from fetched content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub platform: RepoPlatform,
    pub owner: String,
    pub repo_name: String,
    /// Path points into the repository wiki.
    pub is_wiki: bool,
    /// Hostname is a generated pages site such as `owner.github.io`.
    pub is_pages_site: bool,
    /// Final path segment is a README file.
    pub is_readme_file: bool,
    /// Path inside the repository, with `tree`/`blob` markers and the
    /// branch segment stripped. Empty at the repository root.
    pub sub_path: String,
}

/// Kind of a single repository-listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One file or directory in a fetched repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ListingEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// Structural signals extracted from a fetched repository listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoFeatures {
    pub entries: Vec<ListingEntry>,
    /// Bounded markdown rendering of the README body, empty when no
    /// README container was found.
    pub readme_sample: String,
}

impl RepoFeatures {
    /// Number of markdown files in the listing.
    pub fn markdown_file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::File && has_markdown_extension(&e.name))
            .count()
    }
}

fn has_markdown_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown") || lower.ends_with(".mdx")
}

/// Structural signals extracted from a fetched web page.
///
/// All fields are observations: scoring them into evidence happens in
/// [`crate::content`], so extraction stays independent of the weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageFeatures {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub first_heading: Option<String>,
    /// h1/h2/h3 texts in document order, bounded.
    pub headings: Vec<String>,
    pub has_sidebar: bool,
    /// Link labels found inside the first sidebar/TOC container.
    pub sidebar_links: Vec<String>,
    pub code_block_count: usize,
    pub has_search_box: bool,
    pub has_version_selector: bool,
    /// Bounded markdown rendering of the main content area.
    pub content_sample: String,
    /// Page carries a "last updated" style timestamp.
    pub has_last_updated: bool,
    /// Page has next/previous pagination links.
    pub has_pagination: bool,
}

/// Which pipeline stage produced the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultSource {
    /// A strong URL signal short-circuited the pipeline before any fetch.
    UrlPattern,
    /// Local content evidence was confident enough on its own.
    ContentAnalysis,
    /// The arbiter's verdict replaced the local one.
    ContentAnalysisWithArbiter,
    /// The arbiter was consulted but failed or abstained; local verdict
    /// at reduced confidence.
    ArbiterFallback,
    /// Content could not be fetched; URL pattern evidence only.
    FetchFailureFallback,
    /// The input failed URL parsing; nothing ran.
    InvalidUrl,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::UrlPattern => "url-pattern",
            ResultSource::ContentAnalysis => "content-analysis",
            ResultSource::ContentAnalysisWithArbiter => "content-analysis-with-arbiter",
            ResultSource::ArbiterFallback => "arbiter-fallback",
            ResultSource::FetchFailureFallback => "fetch-failure-fallback",
            ResultSource::InvalidUrl => "invalid-url",
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final outcome of one classification run.
///
/// Every path through the engine resolves to one of these; callers never
/// see an error. The evidence trail records how the verdict was reached,
/// in the order the signals were collected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub url: String,
    pub is_documentation: bool,
    /// Confidence in the verdict, in [0, 1].
    pub confidence: f64,
    pub source: ResultSource,
    /// Sum of all evidence scores collected during the run.
    pub total_score: i32,
    pub evidence: Vec<Evidence>,
    pub checked_at: DateTime<Utc>,
}

/// Everything the engine hands the arbiter when local evidence is weak.
#[derive(Debug, Clone)]
pub struct ArbiterRequest {
    pub url: String,
    pub category: UrlCategory,
    pub evidence: Vec<Evidence>,
    pub page: Option<PageFeatures>,
    pub repo: Option<RepoFeatures>,
}

/// Structured verdict returned by the arbiter.
///
/// A reply that does not deserialize into this shape is a schema error,
/// never a silently-wrong default.
#[derive(Debug, Clone, Deserialize)]
pub struct ArbiterVerdict {
    pub is_documentation: bool,
    /// Self-reported confidence in [0, 1], clamped on ingestion.
    pub confidence: f64,
    pub reasoning: String,
}
