//! The classification pipeline.
//!
//! One engine owns the whole flow: cache check, rate gate, URL pattern
//! analysis, content fetch, feature extraction, evidence aggregation,
//! arbiter fallback, cache store. Every path resolves to a
//! [`ClassificationResult`]; errors from collaborators only ever select a
//! weaker evidence source.

use chrono::Utc;
use url::Url;

use crate::cache::ResultCache;
use crate::config::ClassifierConfig;
use crate::content;
use crate::evidence::{self, Evidence, clamp_confidence};
use crate::models::{ArbiterRequest, ClassificationResult, ResultSource, UrlCategory};
use crate::rate_limit::RateLimiter;
use crate::traits::{Arbiter, FeatureExtractor, Fetcher};
use crate::url_pattern::{self, PatternAnalysis};

/// Confidence attached to verdicts decided by URL pattern alone.
const PATTERN_CONFIDENCE: f64 = 0.85;
/// Confidence attached to verdicts made without content.
const FETCH_FAILURE_CONFIDENCE: f64 = 0.6;
/// Damping applied to the local confidence when a consulted arbiter
/// abstains or fails.
const ABSTAIN_DAMPING: f64 = 0.8;

/// Decides whether URLs point to technical documentation.
///
/// Generic over its collaborators so tests can run the full pipeline with
/// mock implementations and no network.
pub struct ClassificationEngine<F, X, A>
where
    F: Fetcher,
    X: FeatureExtractor,
    A: Arbiter,
{
    fetcher: F,
    extractor: X,
    arbiter: Option<A>,
    cache: ResultCache,
    limiter: RateLimiter,
    config: ClassifierConfig,
}

impl<F, X, A> ClassificationEngine<F, X, A>
where
    F: Fetcher,
    X: FeatureExtractor,
    A: Arbiter,
{
    /// Engine without an arbiter; heuristics decide everything.
    pub fn new(fetcher: F, extractor: X, config: ClassifierConfig) -> Self {
        Self::build(fetcher, extractor, None, config)
    }

    /// Engine with an arbiter, consulted when local evidence is weak.
    pub fn with_arbiter(fetcher: F, extractor: X, arbiter: A, config: ClassifierConfig) -> Self {
        Self::build(fetcher, extractor, Some(arbiter), config)
    }

    fn build(fetcher: F, extractor: X, arbiter: Option<A>, config: ClassifierConfig) -> Self {
        let cache = ResultCache::new(config.cache_ttl);
        let limiter = RateLimiter::new(config.requests_per_minute);
        Self {
            fetcher,
            extractor,
            arbiter,
            cache,
            limiter,
            config,
        }
    }

    /// Classify a URL. Infallible by contract: malformed input, fetch
    /// failures, and arbiter failures all degrade to weaker evidence
    /// sources instead of surfacing as errors.
    pub async fn classify(&self, url: &str) -> ClassificationResult {
        // A malformed URL terminates immediately: no cache entry, no rate
        // budget, no network.
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(%url, error = %e, "rejecting unparseable URL");
                return ClassificationResult {
                    url: url.to_string(),
                    is_documentation: false,
                    confidence: 0.0,
                    source: ResultSource::InvalidUrl,
                    total_score: 0,
                    evidence: vec![Evidence::new(0, format!("URL failed to parse: {e}"))],
                    checked_at: Utc::now(),
                };
            }
        };

        if let Some(hit) = self.cache.get(url).await {
            tracing::debug!(%url, "cache hit");
            return hit;
        }

        // The rate gate covers the whole run, fetch and arbiter included.
        self.limiter.acquire().await;

        let pattern = url_pattern::analyze(&parsed);
        tracing::debug!(
            %url,
            category = %pattern.category,
            signals = pattern.evidence.len(),
            "pattern analysis complete"
        );

        let result = self.run(url, pattern).await;
        self.cache.insert(url, result.clone()).await;
        result
    }

    /// Boolean-only projection of [`classify`](Self::classify).
    pub async fn is_documentation(&self, url: &str) -> bool {
        self.classify(url).await.is_documentation
    }

    async fn run(&self, url: &str, pattern: PatternAnalysis) -> ClassificationResult {
        // Strong hostname or commerce signals skip fetching entirely.
        if pattern.strong_positive || pattern.strong_negative {
            let agg = evidence::aggregate(&pattern.evidence);
            tracing::info!(%url, total = agg.total_score, "strong URL signal, skipping fetch");
            return finish(
                url,
                agg.is_documentation(),
                PATTERN_CONFIDENCE,
                ResultSource::UrlPattern,
                agg.total_score,
                pattern.evidence,
            );
        }

        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(%url, error = %e, "fetch failed, using pattern evidence only");
                let agg = evidence::aggregate(&pattern.evidence);
                return finish(
                    url,
                    agg.is_documentation(),
                    FETCH_FAILURE_CONFIDENCE,
                    ResultSource::FetchFailureFallback,
                    agg.total_score,
                    pattern.evidence,
                );
            }
        };
        tracing::debug!(%url, bytes = html.len(), "fetched content");

        let features = match pattern.category {
            UrlCategory::DedicatedDocSite => {
                self.extractor.page_features(&html).map(|f| (Some(f), None))
            }
            UrlCategory::RepositoryListing => {
                self.extractor.repo_features(&html).map(|f| (None, Some(f)))
            }
        };
        let (page, repo) = match features {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(%url, error = %e, "feature extraction failed, using pattern evidence only");
                let agg = evidence::aggregate(&pattern.evidence);
                return finish(
                    url,
                    agg.is_documentation(),
                    FETCH_FAILURE_CONFIDENCE,
                    ResultSource::FetchFailureFallback,
                    agg.total_score,
                    pattern.evidence,
                );
            }
        };

        let mut evidence = pattern.evidence;
        if let Some(features) = &page {
            evidence.extend(content::score_page(features));
        }
        if let Some(features) = &repo {
            evidence.extend(content::score_repo(features));
        }

        let agg = evidence::aggregate(&evidence);
        tracing::debug!(
            %url,
            total = agg.total_score,
            confidence = agg.confidence,
            "aggregated local evidence"
        );

        if agg.confidence >= self.config.local_confidence_threshold {
            return finish(
                url,
                agg.is_documentation(),
                agg.confidence,
                ResultSource::ContentAnalysis,
                agg.total_score,
                evidence,
            );
        }

        let Some(arbiter) = &self.arbiter else {
            return finish(
                url,
                agg.is_documentation(),
                agg.confidence,
                ResultSource::ContentAnalysis,
                agg.total_score,
                evidence,
            );
        };

        let request = ArbiterRequest {
            url: url.to_string(),
            category: pattern.category,
            evidence: evidence.clone(),
            page,
            repo,
        };
        match arbiter.judge(&request).await {
            Ok(verdict) => {
                let verdict_confidence = verdict.confidence.clamp(0.0, 1.0);
                if verdict_confidence >= self.config.min_arbiter_confidence {
                    tracing::info!(
                        %url,
                        is_documentation = verdict.is_documentation,
                        confidence = verdict_confidence,
                        reasoning = %verdict.reasoning,
                        "arbiter verdict accepted"
                    );
                    finish(
                        url,
                        verdict.is_documentation,
                        verdict_confidence,
                        ResultSource::ContentAnalysisWithArbiter,
                        agg.total_score,
                        evidence,
                    )
                } else {
                    tracing::info!(
                        %url,
                        confidence = verdict_confidence,
                        "arbiter abstained, keeping local verdict"
                    );
                    finish(
                        url,
                        agg.is_documentation(),
                        clamp_confidence(agg.confidence * ABSTAIN_DAMPING),
                        ResultSource::ArbiterFallback,
                        agg.total_score,
                        evidence,
                    )
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "arbiter failed, keeping local verdict");
                finish(
                    url,
                    agg.is_documentation(),
                    clamp_confidence(agg.confidence * ABSTAIN_DAMPING),
                    ResultSource::ArbiterFallback,
                    agg.total_score,
                    evidence,
                )
            }
        }
    }
}

fn finish(
    url: &str,
    is_documentation: bool,
    confidence: f64,
    source: ResultSource,
    total_score: i32,
    evidence: Vec<Evidence>,
) -> ClassificationResult {
    tracing::info!(%url, is_documentation, confidence, source = %source, "classification complete");
    ClassificationResult {
        url: url.to_string(),
        is_documentation,
        confidence,
        source,
        total_score,
        evidence,
        checked_at: Utc::now(),
    }
}
