//! URL shape analysis, the cheap first stage of classification.
//!
//! Inspects only the parsed URL (hostname and path) against known
//! documentation hosts, path keywords, and code-hosting platforms. Each
//! rule contributes independent signed evidence; the hostname tables stop
//! at the first match so near-duplicate patterns are not double-counted.

use url::Url;

use crate::evidence::Evidence;
use crate::models::{RepoPlatform, RepositoryInfo, UrlCategory};

const SCORE_DOC_SUBDOMAIN: i32 = 30;
const SCORE_DOC_HOST: i32 = 30;
const SCORE_PATH_KEYWORD: i32 = 15;
const SCORE_DOC_EXTENSION: i32 = 5;
const SCORE_COMMERCE_PATH: i32 = -15;
const SCORE_REPO_WIKI: i32 = 25;
const SCORE_PAGES_SITE: i32 = 18;
const SCORE_README_FILE: i32 = 10;
const SCORE_DOC_BLOB: i32 = 8;
const SCORE_REPO_ROOT: i32 = -5;

/// Hostname prefixes that mark dedicated documentation subdomains.
const DOC_SUBDOMAINS: &[&str] = &[
    "docs.",
    "doc.",
    "developer.",
    "developers.",
    "api.",
    "wiki.",
    "help.",
    "support.",
    "devdocs.",
    "manual.",
];

/// Hosting platforms that serve almost nothing but documentation.
const DOC_HOSTS: &[&str] = &[
    "readthedocs.io",
    "readthedocs.org",
    "rtfd.io",
    "gitbook.io",
    "readme.io",
    "docs.rs",
    "devdocs.io",
];

/// Path segments that typically hold documentation. Only the first
/// matching segment contributes evidence.
const DOC_PATH_SEGMENTS: &[&str] = &[
    "docs",
    "doc",
    "documentation",
    "guide",
    "guides",
    "reference",
    "tutorial",
    "tutorials",
    "manual",
    "api",
    "apidocs",
    "handbook",
    "learn",
    "getting-started",
    "quickstart",
    "faq",
    "howto",
    "wiki",
];

/// File extensions documentation is typically written in.
const DOC_EXTENSIONS: &[&str] = &[
    ".md",
    ".markdown",
    ".mdx",
    ".rst",
    ".adoc",
    ".asciidoc",
    ".txt",
    ".pdf",
];

/// Path segments that mark commerce, marketing, or account pages.
const COMMERCE_SEGMENTS: &[&str] = &[
    "cart",
    "checkout",
    "pricing",
    "buy",
    "purchase",
    "shop",
    "store",
    "order",
    "login",
    "signin",
    "sign-in",
    "signup",
    "sign-up",
    "register",
    "account",
    "billing",
    "careers",
    "jobs",
];

/// Everything the pattern stage learned from the URL alone.
#[derive(Debug, Clone)]
pub struct PatternAnalysis {
    /// Signals in the order they were collected: hostname, path, platform.
    pub evidence: Vec<Evidence>,
    pub category: UrlCategory,
    /// Present when the URL resolves to a recognizable repository.
    pub repo: Option<RepositoryInfo>,
    /// A hostname signal decisive enough to skip fetching entirely.
    pub strong_positive: bool,
    /// A commerce or article signal decisive enough to skip fetching.
    pub strong_negative: bool,
}

/// Analyze a parsed URL. Pure: no I/O, no clock.
pub fn analyze(url: &Url) -> PatternAnalysis {
    let host = url.host_str().unwrap_or("").to_lowercase();
    let path = url.path().to_lowercase();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut evidence = Vec::new();
    let mut strong_positive = false;
    let mut strong_negative = false;

    if let Some(prefix) = DOC_SUBDOMAINS.iter().find(|p| host.starts_with(*p)) {
        evidence.push(Evidence::new(
            SCORE_DOC_SUBDOMAIN,
            format!("hostname starts with {prefix}"),
        ));
        strong_positive = true;
    } else if let Some(known) = DOC_HOSTS
        .iter()
        .find(|h| host == **h || host.ends_with(&format!(".{h}")))
    {
        evidence.push(Evidence::new(
            SCORE_DOC_HOST,
            format!("hosted on documentation platform {known}"),
        ));
        strong_positive = true;
    }

    if let Some(segment) = segments.iter().find(|s| DOC_PATH_SEGMENTS.contains(s)) {
        evidence.push(Evidence::new(
            SCORE_PATH_KEYWORD,
            format!("documentation path segment /{segment}"),
        ));
    }

    if let Some(extension) = DOC_EXTENSIONS.iter().find(|e| path.ends_with(*e)) {
        evidence.push(Evidence::new(
            SCORE_DOC_EXTENSION,
            format!("documentation file extension {extension}"),
        ));
    }

    if let Some(segment) = segments.iter().find(|s| COMMERCE_SEGMENTS.contains(s)) {
        evidence.push(Evidence::new(
            SCORE_COMMERCE_PATH,
            format!("commerce or account path segment /{segment}"),
        ));
        strong_negative = true;
    } else if is_article_path(&segments) {
        evidence.push(Evidence::new(
            SCORE_COMMERCE_PATH,
            "single blog or news article path",
        ));
        strong_negative = true;
    }

    let mut category = UrlCategory::DedicatedDocSite;
    let mut repo = None;
    if let Some((platform, is_pages_site)) = platform_for_host(&host) {
        category = UrlCategory::RepositoryListing;
        repo = parse_repository(platform, is_pages_site, &host, &segments);
        if let Some(info) = &repo {
            evidence.extend(repository_evidence(info, &path));
        }
    }

    PatternAnalysis {
        evidence,
        category,
        repo,
        strong_positive,
        strong_negative,
    }
}

/// A path like /blog/some-post or /news/some-story is a single article,
/// not documentation. A bare /blog landing page does not count.
fn is_article_path(segments: &[&str]) -> bool {
    segments
        .windows(2)
        .any(|w| (w[0] == "blog" || w[0] == "news") && !w[1].is_empty())
}

fn platform_for_host(host: &str) -> Option<(RepoPlatform, bool)> {
    match host {
        "github.com" | "www.github.com" => Some((RepoPlatform::GitHub, false)),
        "gitlab.com" | "www.gitlab.com" => Some((RepoPlatform::GitLab, false)),
        "bitbucket.org" | "www.bitbucket.org" => Some((RepoPlatform::Bitbucket, false)),
        _ if host.ends_with(".github.io") => Some((RepoPlatform::GitHub, true)),
        _ if host.ends_with(".gitlab.io") => Some((RepoPlatform::GitLab, true)),
        _ if host.ends_with(".bitbucket.io") => Some((RepoPlatform::Bitbucket, true)),
        _ => None,
    }
}

fn parse_repository(
    platform: RepoPlatform,
    is_pages_site: bool,
    host: &str,
    segments: &[&str],
) -> Option<RepositoryInfo> {
    if is_pages_site {
        // owner.github.io[/project[/...]]: the subdomain is the owner. A
        // bare host is the owner's own pages repository.
        let owner = host.split('.').next().unwrap_or(host).to_string();
        let (repo_name, rest) = match segments.split_first() {
            Some((first, rest)) => ((*first).to_string(), rest),
            None => (host.to_string(), &[][..]),
        };
        let is_readme_file = rest.last().is_some_and(|s| s.starts_with("readme"));
        return Some(RepositoryInfo {
            platform,
            owner,
            repo_name,
            is_wiki: false,
            is_pages_site: true,
            is_readme_file,
            sub_path: rest.join("/"),
        });
    }

    let (&owner, tail) = segments.split_first()?;
    let (&repo_name, tail) = tail.split_first()?;
    // GitLab inserts a literal `-` segment before tree/blob/wikis.
    let tail: Vec<&str> = tail.iter().copied().filter(|s| *s != "-").collect();

    let is_wiki = matches!(tail.first(), Some(&"wiki") | Some(&"wikis"));
    // The segment after a tree/blob/src/raw marker is the branch.
    let sub_path_parts: &[&str] = match tail.first() {
        Some(&"tree") | Some(&"blob") | Some(&"raw") | Some(&"src") => {
            tail.get(2..).unwrap_or(&[])
        }
        Some(&"wiki") | Some(&"wikis") => tail.get(1..).unwrap_or(&[]),
        _ => tail.as_slice(),
    };
    let is_readme_file = sub_path_parts.last().is_some_and(|s| s.starts_with("readme"));

    Some(RepositoryInfo {
        platform,
        owner: owner.to_string(),
        repo_name: repo_name.to_string(),
        is_wiki,
        is_pages_site: false,
        is_readme_file,
        sub_path: sub_path_parts.join("/"),
    })
}

fn repository_evidence(info: &RepositoryInfo, path: &str) -> Vec<Evidence> {
    let mut evidence = Vec::new();

    if info.is_wiki {
        evidence.push(Evidence::new(SCORE_REPO_WIKI, "repository wiki page"));
    }
    if info.is_pages_site {
        evidence.push(Evidence::new(SCORE_PAGES_SITE, "generated pages site"));
    }
    if info.is_readme_file {
        evidence.push(Evidence::new(SCORE_README_FILE, "README file path"));
    }

    let is_file_view = ["/blob/", "/raw/", "/src/"].iter().any(|m| path.contains(m));
    if is_file_view && DOC_EXTENSIONS.iter().any(|e| path.ends_with(e)) {
        evidence.push(Evidence::new(
            SCORE_DOC_BLOB,
            "file view of a documentation file",
        ));
    }

    if info.sub_path.is_empty() && !info.is_wiki && !info.is_pages_site && !info.is_readme_file {
        evidence.push(Evidence::new(
            SCORE_REPO_ROOT,
            "bare repository root, content unknown",
        ));
    }

    evidence
}
