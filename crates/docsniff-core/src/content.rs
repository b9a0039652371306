//! Turns extracted page and repository features into signed evidence.
//!
//! This is the pure half of content analysis. The DOM work happens in a
//! [`crate::traits::FeatureExtractor`] implementation; everything here is
//! plain string matching over the resulting feature structs, so the
//! scoring tables are unit-testable without any HTML in the loop.

use crate::evidence::Evidence;
use crate::models::{EntryKind, PageFeatures, RepoFeatures};

const SCORE_SIDEBAR: i32 = 15;
const SCORE_SIDEBAR_SECTIONS: i32 = 10;
const SCORE_CODE_BLOCKS: i32 = 10;
const SCORE_SEARCH_BOX: i32 = 8;
const SCORE_VERSION_SELECTOR: i32 = 10;
const SCORE_TITLE_KEYWORD: i32 = 10;
const SCORE_LAST_UPDATED: i32 = 5;
const SCORE_PAGINATION: i32 = 8;
const SCORE_COMMERCE_PHRASE: i32 = -15;
const SCORE_MARKDOWN_FILES: i32 = 10;
const SCORE_DOC_DIRECTORY: i32 = 20;
const SCORE_LANGUAGE_FOLDERS: i32 = 8;
const SCORE_README_KEYWORDS: i32 = 10;

/// A listing needs more markdown files than this before it counts as
/// documentation-heavy; a README plus a license is just a repository.
const MARKDOWN_FILE_THRESHOLD: usize = 3;

/// Section names a documentation sidebar tends to carry.
const SIDEBAR_SECTIONS: &[&str] = &[
    "getting started",
    "introduction",
    "installation",
    "quick start",
    "quickstart",
    "api",
    "api reference",
    "examples",
    "configuration",
    "usage",
    "faq",
    "changelog",
];

/// Keywords marking documentation-flavored titles and headings.
const TITLE_KEYWORDS: &[&str] = &[
    "documentation",
    "docs",
    "manual",
    "guide",
    "reference",
    "api",
    "handbook",
    "tutorial",
];

/// Phrases that give away usage-instruction READMEs.
const README_KEYWORDS: &[&str] = &[
    "getting started",
    "installation",
    "usage",
    "documentation",
    "api reference",
    "quick start",
    "how to use",
    "examples",
];

/// Directory names that hold documentation.
const DOC_DIRECTORIES: &[&str] = &[
    "docs",
    "documentation",
    "wiki",
    "guide",
    "guides",
    "api",
    "reference",
    "manual",
    "handbook",
];

/// Phrases that mark commerce or marketing pages. One hit is enough;
/// repeats are never double-counted.
const COMMERCE_PHRASES: &[&str] = &[
    "add to cart",
    "buy now",
    "free shipping",
    "shop now",
    "view cart",
    "limited time offer",
    "pricing plans",
    "start your free trial",
    "money-back guarantee",
    "proceed to checkout",
];

/// ISO 639-1 codes that show up as translation folders. The curated list
/// keeps `js/` or `go/` from counting as languages.
const LANGUAGE_CODES: &[&str] = &[
    "ar", "cs", "da", "de", "el", "en", "es", "fa", "fi", "fr", "he", "hi", "hu", "id", "it",
    "ja", "ko", "nl", "no", "pl", "pt", "ro", "ru", "sv", "th", "tr", "uk", "vi", "zh",
];

/// Score the features of a dedicated site page.
pub fn score_page(features: &PageFeatures) -> Vec<Evidence> {
    let mut evidence = Vec::new();

    if features.has_sidebar {
        evidence.push(Evidence::new(
            SCORE_SIDEBAR,
            "sidebar or table-of-contents navigation present",
        ));
        let hits = sidebar_section_hits(&features.sidebar_links);
        if !hits.is_empty() {
            evidence.push(Evidence::new(
                SCORE_SIDEBAR_SECTIONS,
                format!("sidebar lists canonical sections: {}", hits.join(", ")),
            ));
        }
    }

    if features.code_block_count > 0 {
        evidence.push(Evidence::new(
            SCORE_CODE_BLOCKS,
            format!("{} code block(s) on the page", features.code_block_count),
        ));
    }
    if features.has_search_box {
        evidence.push(Evidence::new(SCORE_SEARCH_BOX, "search box present"));
    }
    if features.has_version_selector {
        evidence.push(Evidence::new(
            SCORE_VERSION_SELECTOR,
            "version selector present",
        ));
    }
    if let Some(keyword) = title_keyword_hit(features) {
        evidence.push(Evidence::new(
            SCORE_TITLE_KEYWORD,
            format!("title or heading mentions \"{keyword}\""),
        ));
    }
    if features.has_last_updated {
        evidence.push(Evidence::new(
            SCORE_LAST_UPDATED,
            "last-updated timestamp present",
        ));
    }
    if features.has_pagination {
        evidence.push(Evidence::new(
            SCORE_PAGINATION,
            "next/previous page navigation present",
        ));
    }
    if let Some(phrase) = commerce_phrase_hit(&features.content_sample) {
        evidence.push(Evidence::new(
            SCORE_COMMERCE_PHRASE,
            format!("commerce phrase \"{phrase}\" in page content"),
        ));
    }

    evidence
}

/// Score the features of a repository listing.
pub fn score_repo(features: &RepoFeatures) -> Vec<Evidence> {
    let mut evidence = Vec::new();

    let markdown = features.markdown_file_count();
    if markdown > MARKDOWN_FILE_THRESHOLD {
        evidence.push(Evidence::new(
            SCORE_MARKDOWN_FILES,
            format!("{markdown} markdown files in the listing"),
        ));
    }

    let doc_dirs = directory_names(features, is_doc_directory);
    if !doc_dirs.is_empty() {
        evidence.push(Evidence::new(
            SCORE_DOC_DIRECTORY,
            format!("documentation directory present: {}", doc_dirs.join(", ")),
        ));
    }

    let language_dirs = directory_names(features, is_language_folder);
    if !language_dirs.is_empty() {
        evidence.push(Evidence::new(
            SCORE_LANGUAGE_FOLDERS,
            format!("translation folders present: {}", language_dirs.join(", ")),
        ));
    }

    if let Some(keyword) = readme_keyword_hit(&features.readme_sample) {
        evidence.push(Evidence::new(
            SCORE_README_KEYWORDS,
            format!("README mentions \"{keyword}\""),
        ));
    }

    evidence
}

fn directory_names(features: &RepoFeatures, matches: fn(&str) -> bool) -> Vec<&str> {
    features
        .entries
        .iter()
        .filter(|e| e.kind == EntryKind::Directory && matches(&e.name))
        .map(|e| e.name.as_str())
        .collect()
}

fn is_doc_directory(name: &str) -> bool {
    let name = name.to_lowercase();
    let name = name.trim_end_matches('/');
    DOC_DIRECTORIES.iter().any(|d| *d == name)
}

fn is_language_folder(name: &str) -> bool {
    let name = name.to_lowercase();
    let name = name.trim_end_matches('/');
    if LANGUAGE_CODES.iter().any(|c| *c == name) {
        return true;
    }
    // Locale-style names such as zh-cn or pt_br.
    let mut parts = name.splitn(2, ['-', '_']);
    match (parts.next(), parts.next()) {
        (Some(language), Some(region)) => {
            LANGUAGE_CODES.iter().any(|c| *c == language)
                && region.len() == 2
                && region.chars().all(|ch| ch.is_ascii_alphabetic())
        }
        _ => false,
    }
}

fn sidebar_section_hits(links: &[String]) -> Vec<&'static str> {
    let labels: Vec<String> = links.iter().map(|l| l.to_lowercase()).collect();
    SIDEBAR_SECTIONS
        .iter()
        .copied()
        .filter(|section| labels.iter().any(|label| label_matches(label, section)))
        .collect()
}

/// Single-word sections ("api") must match a whole word of the label;
/// multi-word phrases may appear anywhere in it.
fn label_matches(label: &str, section: &str) -> bool {
    if section.contains(' ') {
        label.contains(section)
    } else {
        label
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == section)
    }
}

fn title_keyword_hit(features: &PageFeatures) -> Option<&'static str> {
    let haystack = format!(
        "{} {}",
        features.title.as_deref().unwrap_or(""),
        features.first_heading.as_deref().unwrap_or("")
    )
    .to_lowercase();
    TITLE_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| label_matches(&haystack, keyword))
}

fn readme_keyword_hit(sample: &str) -> Option<&'static str> {
    let lower = sample.to_lowercase();
    README_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lower.contains(keyword))
}

fn commerce_phrase_hit(sample: &str) -> Option<&'static str> {
    let lower = sample.to_lowercase();
    COMMERCE_PHRASES
        .iter()
        .copied()
        .find(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingEntry;

    fn total(evidence: &[Evidence]) -> i32 {
        evidence.iter().map(|e| e.score).sum()
    }

    #[test]
    fn empty_page_features_score_nothing() {
        let evidence = score_page(&PageFeatures::default());
        assert!(evidence.is_empty());
    }

    #[test]
    fn doc_site_page_accumulates_structural_signals() {
        let features = PageFeatures {
            title: Some("Widget Documentation".to_string()),
            first_heading: Some("Getting Started".to_string()),
            has_sidebar: true,
            sidebar_links: vec![
                "Getting Started".to_string(),
                "API Reference".to_string(),
                "Examples".to_string(),
            ],
            code_block_count: 12,
            has_search_box: true,
            has_version_selector: true,
            has_last_updated: true,
            has_pagination: true,
            ..PageFeatures::default()
        };
        let evidence = score_page(&features);
        assert_eq!(
            total(&evidence),
            SCORE_SIDEBAR
                + SCORE_SIDEBAR_SECTIONS
                + SCORE_CODE_BLOCKS
                + SCORE_SEARCH_BOX
                + SCORE_VERSION_SELECTOR
                + SCORE_TITLE_KEYWORD
                + SCORE_LAST_UPDATED
                + SCORE_PAGINATION
        );
    }

    #[test]
    fn sidebar_sections_require_a_sidebar() {
        let features = PageFeatures {
            has_sidebar: false,
            sidebar_links: vec!["Getting Started".to_string()],
            ..PageFeatures::default()
        };
        let evidence = score_page(&features);
        assert!(evidence.iter().all(|e| e.score != SCORE_SIDEBAR_SECTIONS));
    }

    #[test]
    fn title_keyword_matches_whole_words_only() {
        let features = PageFeatures {
            title: Some("Rapid prototyping for therapists".to_string()),
            ..PageFeatures::default()
        };
        // "api" inside "Rapid"/"therapists" must not count.
        assert!(score_page(&features).is_empty());

        let features = PageFeatures {
            title: Some("Widget API".to_string()),
            ..PageFeatures::default()
        };
        let evidence = score_page(&features);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].score, SCORE_TITLE_KEYWORD);
    }

    #[test]
    fn commerce_phrase_scores_once_regardless_of_repeats() {
        let features = PageFeatures {
            content_sample: "Buy now! Limited stock. Buy now! Add to cart today.".to_string(),
            ..PageFeatures::default()
        };
        let evidence = score_page(&features);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].score, SCORE_COMMERCE_PHRASE);
    }

    #[test]
    fn markdown_heavy_listing_scores_positive() {
        let features = RepoFeatures {
            entries: vec![
                ListingEntry::file("intro.md"),
                ListingEntry::file("setup.md"),
                ListingEntry::file("usage.md"),
                ListingEntry::file("faq.md"),
            ],
            readme_sample: String::new(),
        };
        let evidence = score_repo(&features);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].score, SCORE_MARKDOWN_FILES);
    }

    #[test]
    fn a_few_markdown_files_are_not_enough() {
        let features = RepoFeatures {
            entries: vec![
                ListingEntry::file("README.md"),
                ListingEntry::file("LICENSE.md"),
            ],
            readme_sample: String::new(),
        };
        assert!(score_repo(&features).is_empty());
    }

    #[test]
    fn doc_directory_scores_regardless_of_case() {
        let features = RepoFeatures {
            entries: vec![
                ListingEntry::directory("Docs"),
                ListingEntry::directory("src"),
            ],
            readme_sample: String::new(),
        };
        let evidence = score_repo(&features);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].score, SCORE_DOC_DIRECTORY);
        assert!(evidence[0].reason.contains("Docs"));
    }

    #[test]
    fn doc_directory_must_be_a_directory() {
        let features = RepoFeatures {
            entries: vec![ListingEntry::file("docs")],
            readme_sample: String::new(),
        };
        assert!(score_repo(&features).is_empty());
    }

    #[test]
    fn language_folders_match_codes_and_locales_but_not_source_dirs() {
        assert!(is_language_folder("en"));
        assert!(is_language_folder("zh-cn"));
        assert!(is_language_folder("pt_BR"));
        assert!(!is_language_folder("js"));
        assert!(!is_language_folder("go"));
        assert!(!is_language_folder("rs"));
        assert!(!is_language_folder("lib"));
    }

    #[test]
    fn readme_usage_instructions_score_positive() {
        let features = RepoFeatures {
            entries: Vec::new(),
            readme_sample: "## Installation\n\nRun the installer, then see usage below."
                .to_string(),
        };
        let evidence = score_repo(&features);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].score, SCORE_README_KEYWORDS);
    }

    #[test]
    fn documentation_repo_listing_scores_all_signals() {
        let features = RepoFeatures {
            entries: vec![
                ListingEntry::directory("docs"),
                ListingEntry::directory("en"),
                ListingEntry::directory("ja"),
                ListingEntry::file("overview.md"),
                ListingEntry::file("install.md"),
                ListingEntry::file("config.md"),
                ListingEntry::file("api.md"),
            ],
            readme_sample: "Getting started with the project.".to_string(),
        };
        let evidence = score_repo(&features);
        assert_eq!(
            total(&evidence),
            SCORE_MARKDOWN_FILES
                + SCORE_DOC_DIRECTORY
                + SCORE_LANGUAGE_FOLDERS
                + SCORE_README_KEYWORDS
        );
    }
}
