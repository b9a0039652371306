use std::collections::HashSet;
use std::sync::Arc;

use docsniff_core::error::ClassifyError;
use docsniff_core::models::{EntryKind, ListingEntry, PageFeatures, RepoFeatures};
use docsniff_core::traits::FeatureExtractor;
use docsniff_core::util::{tidy_text, truncate_chars};
use htmd::HtmlToMarkdown;
use scraper::{ElementRef, Html, Selector};

/// Free-text samples are cut at this many characters; enough for keyword
/// matching and a useful arbiter prompt.
const MAX_SAMPLE_CHARS: usize = 2_000;
/// A content container shorter than this is chrome, not content; the
/// whole page is used instead.
const MIN_SAMPLE_CHARS: usize = 100;
const MAX_HEADINGS: usize = 10;
const MAX_SIDEBAR_LINKS: usize = 30;

/// Containers probed for the main content, most specific first.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    "#content",
    ".markdown-body",
    ".md-content",
    ".rst-content",
    ".document",
];

/// Sidebar and table-of-contents containers across common documentation
/// themes (Sphinx, MkDocs, Docusaurus, VitePress, hand-rolled).
const SIDEBAR_SELECTORS: &[&str] = &[
    ".sidebar",
    ".docs-sidebar",
    ".sidebar-nav",
    "#sidebar",
    ".toc",
    ".table-of-contents",
    "#toc",
    ".wy-nav-side",
    ".md-sidebar",
    ".theme-doc-sidebar-container",
    ".VPSidebar",
    "aside",
];

const SEARCH_SELECTORS: &[&str] = &[
    "input[type=\"search\"]",
    "[role=\"search\"]",
    ".search-input",
    ".search-box",
    "#search",
    "form.search",
    ".DocSearch",
];

const VERSION_SELECTORS: &[&str] = &[
    ".version-selector",
    ".version-select",
    ".version-switcher",
    "select.versions",
    ".rst-versions",
    "#version-select",
];

/// Rows and anchors that make up a repository file listing, covering both
/// current and legacy GitHub markup plus GitLab/Bitbucket tables.
const LISTING_SELECTORS: &[&str] = &[
    "[role=\"rowheader\"] a",
    ".react-directory-filename-column a",
    ".js-navigation-item .content a",
    ".tree-item-file-name a",
    "table.files td.filename a",
];

/// Containers that hold a rendered README or wiki body.
const README_SELECTORS: &[&str] = &[
    "#readme",
    ".markdown-body",
    ".readme",
    ".wiki-body",
    "article",
    "main",
];

const LAST_UPDATED_PHRASES: &[&str] =
    &["last updated", "last modified", "updated on", "last reviewed"];

const PAGINATION_WORDS: &[&str] = &["next", "previous", "prev"];

/// Extracts structural features from fetched HTML with CSS selectors,
/// sampling text through an HTML-to-Markdown conversion that strips
/// scripts, styles, and page chrome.
///
/// Scoring the features into evidence happens in docsniff-core; this type
/// only reads the DOM.
pub struct ScraperExtractor {
    converter: Arc<HtmlToMarkdown>,
}

impl Clone for ScraperExtractor {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
        }
    }
}

impl ScraperExtractor {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec![
                "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
            ])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }

    fn markdown_sample(&self, html: &str) -> String {
        match self.converter.convert(html) {
            Ok(markdown) => truncate_chars(markdown.trim(), MAX_SAMPLE_CHARS),
            Err(e) => {
                tracing::debug!(error = %e, "markdown conversion failed, sample omitted");
                String::new()
            }
        }
    }

    fn content_sample(&self, document: &Html, full_html: &str) -> String {
        for selector_str in CONTENT_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                let sample = self.markdown_sample(&element.html());
                if sample.chars().count() >= MIN_SAMPLE_CHARS {
                    return sample;
                }
            }
        }
        self.markdown_sample(full_html)
    }
}

impl Default for ScraperExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for ScraperExtractor {
    fn page_features(&self, html: &str) -> Result<PageFeatures, ClassifyError> {
        let document = Html::parse_document(html);

        let title = select_text(&document, "title");
        let meta_description = select_attr(&document, "meta[name=\"description\"]", "content");
        let headings = collect_texts(&document, "h1, h2, h3", MAX_HEADINGS);
        let first_heading = select_text(&document, "h1").or_else(|| headings.first().cloned());

        let sidebar = first_match(&document, SIDEBAR_SELECTORS);
        let has_sidebar = sidebar.is_some();
        let sidebar_links = sidebar
            .map(|element| anchor_texts(element, MAX_SIDEBAR_LINKS))
            .unwrap_or_default();

        let code_block_count = match count_matches(&document, "pre code") {
            0 => count_matches(&document, "pre"),
            n => n,
        };

        let body_text = visible_text(&document).to_lowercase();
        let has_last_updated = LAST_UPDATED_PHRASES.iter().any(|p| body_text.contains(p));

        Ok(PageFeatures {
            title,
            meta_description,
            first_heading,
            headings,
            has_sidebar,
            sidebar_links,
            code_block_count,
            has_search_box: any_match(&document, SEARCH_SELECTORS),
            has_version_selector: any_match(&document, VERSION_SELECTORS),
            content_sample: self.content_sample(&document, html),
            has_last_updated,
            has_pagination: detect_pagination(&document),
        })
    }

    fn repo_features(&self, html: &str) -> Result<RepoFeatures, ClassifyError> {
        let document = Html::parse_document(html);

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for selector_str in LISTING_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for element in document.select(&selector) {
                let name = tidy_text(&element.text().collect::<String>());
                if name.is_empty() || name == ".." || !seen.insert(name.clone()) {
                    continue;
                }
                let kind = entry_kind(element, &name);
                entries.push(ListingEntry { name, kind });
            }
            // One listing structure per page; don't mix selector
            // generations once a match is found.
            if !entries.is_empty() {
                break;
            }
        }

        let readme_sample = README_SELECTORS
            .iter()
            .find_map(|selector_str| {
                let selector = Selector::parse(selector_str).ok()?;
                let element = document.select(&selector).next()?;
                let sample = self.markdown_sample(&element.html());
                (!sample.is_empty()).then_some(sample)
            })
            .unwrap_or_default();

        Ok(RepoFeatures {
            entries,
            readme_sample,
        })
    }
}

/// Directory links point at tree paths, file links at blob or raw paths.
/// When the href gives nothing away, fall back to an extension heuristic.
fn entry_kind(element: ElementRef<'_>, name: &str) -> EntryKind {
    if let Some(href) = element.value().attr("href") {
        if href.contains("/tree/") {
            return EntryKind::Directory;
        }
        if href.contains("/blob/") || href.contains("/raw/") {
            return EntryKind::File;
        }
    }
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => EntryKind::File,
        _ => EntryKind::Directory,
    }
}

fn select_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let element = document.select(&selector).next()?;
    let text = tidy_text(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn select_attr(document: &Html, selector_str: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let value = document
        .select(&selector)
        .next()?
        .value()
        .attr(attr)?
        .trim()
        .to_string();
    (!value.is_empty()).then_some(value)
}

fn collect_texts(document: &Html, selector_str: &str, limit: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|element| tidy_text(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect()
}

fn anchor_texts(element: ElementRef<'_>, limit: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };
    element
        .select(&selector)
        .map(|anchor| tidy_text(&anchor.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect()
}

fn count_matches(document: &Html, selector_str: &str) -> usize {
    match Selector::parse(selector_str) {
        Ok(selector) => document.select(&selector).count(),
        Err(_) => 0,
    }
}

fn any_match(document: &Html, selectors: &[&str]) -> bool {
    selectors.iter().any(|s| count_matches(document, s) > 0)
}

fn first_match<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document.select(&selector).next()
    })
}

/// Text of every node outside script and style subtrees. Unlike the
/// markdown sample this keeps header and footer text, where freshness
/// notes usually live.
fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    push_visible_text(document.root_element(), &mut text);
    text
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    if matches!(element.value().name(), "script" | "style" | "noscript" | "template") {
        return;
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            push_visible_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

fn detect_pagination(document: &Html) -> bool {
    if any_match(document, &["a[rel=\"next\"]", "a[rel=\"prev\"]", ".pagination"]) {
        return true;
    }
    let Ok(selector) = Selector::parse("a") else {
        return false;
    };
    document.select(&selector).any(|anchor| {
        let text = tidy_text(&anchor.text().collect::<String>()).to_lowercase();
        let text = text
            .trim_start_matches(['«', '‹', '←', ' '])
            .trim_end_matches(['»', '›', '→', ' ']);
        PAGINATION_WORDS.contains(&text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_PAGE: &str = r#"<html>
<head>
  <title>Widget Docs</title>
  <meta name="description" content="Reference manual for the widget toolkit">
</head>
<body>
  <div class="sidebar">
    <a href="/start">Getting Started</a>
    <a href="/api">API Reference</a>
    <a href="/examples">Examples</a>
  </div>
  <main>
    <h1>Widget Documentation</h1>
    <h2>Installation</h2>
    <p>The widget toolkit ships as a single static binary. Download the
    release for your platform, unpack it somewhere on your PATH, and run
    the init command to generate a starter configuration file.</p>
    <pre><code>widget init --name demo</code></pre>
    <pre><code>widget run</code></pre>
  </main>
  <input type="search" placeholder="Search docs">
  <div class="version-selector">v2.1</div>
  <a rel="next" href="/install">Next</a>
  <footer>Last updated 2025-03-14</footer>
</body>
</html>"#;

    #[test]
    fn doc_page_features_are_all_detected() {
        let extractor = ScraperExtractor::new();
        let features = extractor.page_features(DOC_PAGE).unwrap();

        assert_eq!(features.title.as_deref(), Some("Widget Docs"));
        assert_eq!(
            features.meta_description.as_deref(),
            Some("Reference manual for the widget toolkit")
        );
        assert_eq!(features.first_heading.as_deref(), Some("Widget Documentation"));
        assert_eq!(features.headings.len(), 2);
        assert!(features.has_sidebar);
        assert_eq!(
            features.sidebar_links,
            vec!["Getting Started", "API Reference", "Examples"]
        );
        assert_eq!(features.code_block_count, 2);
        assert!(features.has_search_box);
        assert!(features.has_version_selector);
        assert!(features.has_last_updated);
        assert!(features.has_pagination);
        assert!(features.content_sample.contains("static binary"));
    }

    #[test]
    fn minimal_page_yields_defaults() {
        let extractor = ScraperExtractor::new();
        let features = extractor
            .page_features("<html><body><p>hello</p></body></html>")
            .unwrap();

        assert!(features.title.is_none());
        assert!(!features.has_sidebar);
        assert!(features.sidebar_links.is_empty());
        assert_eq!(features.code_block_count, 0);
        assert!(!features.has_search_box);
        assert!(!features.has_version_selector);
        assert!(!features.has_last_updated);
        assert!(!features.has_pagination);
        // Too short for a container sample; falls back to the whole page.
        assert!(features.content_sample.contains("hello"));
    }

    #[test]
    fn short_main_falls_back_to_whole_page_text() {
        let html = "<html><body><main>stub</main>\
                    <p>The actual interesting explanation lives outside the main \
                    container on this unusual page, and it is long enough to \
                    serve as a content sample for keyword matching.</p>\
                    </body></html>";
        let extractor = ScraperExtractor::new();
        let features = extractor.page_features(html).unwrap();
        assert!(features.content_sample.contains("interesting explanation"));
    }

    #[test]
    fn plain_next_link_counts_as_pagination() {
        let html = r#"<html><body><a href="/page/2">Next →</a></body></html>"#;
        let extractor = ScraperExtractor::new();
        let features = extractor.page_features(html).unwrap();
        assert!(features.has_pagination);
    }

    #[test]
    fn anchor_text_containing_next_is_not_pagination() {
        let html = r#"<html><body><a href="/x">What comes next for widgets</a></body></html>"#;
        let extractor = ScraperExtractor::new();
        let features = extractor.page_features(html).unwrap();
        assert!(!features.has_pagination);
    }

    const REPO_LISTING: &str = r#"<html><body>
<div role="grid">
  <div role="row"><div role="rowheader"><a href="/widgetco/widget/tree/main/docs">docs</a></div></div>
  <div role="row"><div role="rowheader"><a href="/widgetco/widget/tree/main/src">src</a></div></div>
  <div role="row"><div role="rowheader"><a href="/widgetco/widget/blob/main/README.md">README.md</a></div></div>
  <div role="row"><div role="rowheader"><a href="/widgetco/widget/blob/main/setup.py">setup.py</a></div></div>
  <div role="row"><div role="rowheader"><a href="/widgetco/widget/tree/main/docs">docs</a></div></div>
</div>
<article id="readme">
  <h2>Installation</h2>
  <p>Install the widget toolkit with cargo install widget.</p>
</article>
</body></html>"#;

    #[test]
    fn repo_listing_entries_are_parsed_and_deduplicated() {
        let extractor = ScraperExtractor::new();
        let features = extractor.repo_features(REPO_LISTING).unwrap();

        let names: Vec<&str> = features.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "src", "README.md", "setup.py"]);

        assert_eq!(features.entries[0].kind, EntryKind::Directory);
        assert_eq!(features.entries[2].kind, EntryKind::File);
        assert!(features.readme_sample.contains("Installation"));
    }

    #[test]
    fn wiki_body_is_sampled_as_readme_text() {
        let html = r#"<html><body>
            <div class="wiki-body"><h1>Home</h1><p>Usage notes for the widget wiki.</p></div>
            </body></html>"#;
        let extractor = ScraperExtractor::new();
        let features = extractor.repo_features(html).unwrap();
        assert!(features.entries.is_empty());
        assert!(features.readme_sample.contains("Usage notes"));
    }

    #[test]
    fn entry_kind_prefers_href_over_extension() {
        let html = r#"<html><body>
            <a id="a" href="/o/r/tree/main/README.md">README.md</a>
            <a id="b" href="/o/r/blob/main/LICENSE">LICENSE</a>
            </body></html>"#;
        let document = Html::parse_document(html);
        let a = Selector::parse("#a").unwrap();
        let b = Selector::parse("#b").unwrap();
        let a = document.select(&a).next().unwrap();
        let b = document.select(&b).next().unwrap();
        // A markdown name under a tree href is still a directory.
        assert_eq!(entry_kind(a, "README.md"), EntryKind::Directory);
        assert_eq!(entry_kind(b, "LICENSE"), EntryKind::File);
    }

    #[test]
    fn entry_kind_falls_back_to_the_extension_heuristic() {
        let html = r##"<html><body><a id="x" href="#">x</a></body></html>"##;
        let document = Html::parse_document(html);
        let selector = Selector::parse("#x").unwrap();
        let element = document.select(&selector).next().unwrap();

        assert_eq!(entry_kind(element, "README.md"), EntryKind::File);
        assert_eq!(entry_kind(element, "docs"), EntryKind::Directory);
        // A leading dot alone is not an extension.
        assert_eq!(entry_kind(element, ".github"), EntryKind::Directory);
    }

    #[test]
    fn scripts_and_chrome_are_stripped_from_samples() {
        let html = r#"<html><body>
            <main><p>Real content about the widget API that should survive the
            conversion into markdown text for sampling purposes, padded until
            it clears the minimum sample length.</p></main>
            <script>var tracking = "beacon";</script>
            </body></html>"#;
        let extractor = ScraperExtractor::new();
        let features = extractor.page_features(html).unwrap();
        assert!(features.content_sample.contains("Real content"));
        assert!(!features.content_sample.contains("beacon"));
    }

    #[test]
    fn script_text_is_not_a_freshness_signal() {
        let html = r#"<html><body>
            <p>Widget API overview.</p>
            <script type="application/ld+json">{"dateModified":"2025-03-14","note":"last updated"}</script>
            <style>/* last modified 2025-03-14 */ .stale { color: gray; }</style>
            </body></html>"#;
        let extractor = ScraperExtractor::new();
        let features = extractor.page_features(html).unwrap();
        assert!(!features.has_last_updated);
    }
}
