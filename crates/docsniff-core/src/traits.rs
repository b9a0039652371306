use std::future::Future;

use crate::error::ClassifyError;
use crate::models::{ArbiterRequest, ArbiterVerdict, PageFeatures, RepoFeatures};

/// Fetches raw page content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, ClassifyError>> + Send;
}

/// Extracts structural features from fetched HTML.
///
/// Synchronous on purpose: DOM handles are not `Send`, so all parsing must
/// finish before the pipeline awaits again. Scoring the features into
/// evidence lives in [`crate::content`].
pub trait FeatureExtractor: Send + Sync + Clone {
    fn page_features(&self, html: &str) -> Result<PageFeatures, ClassifyError>;
    fn repo_features(&self, html: &str) -> Result<RepoFeatures, ClassifyError>;
}

/// External judge consulted when local evidence is too weak to decide.
pub trait Arbiter: Send + Sync + Clone {
    fn judge(
        &self,
        request: &ArbiterRequest,
    ) -> impl Future<Output = Result<ArbiterVerdict, ClassifyError>> + Send;
}

/// An arbiter that always abstains.
///
/// Its verdict carries zero confidence, which every sane threshold
/// rejects, so the engine falls back to the local heuristic. Exists to
/// give arbiter-less engines a concrete type parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullArbiter;

impl Arbiter for NullArbiter {
    async fn judge(&self, _request: &ArbiterRequest) -> Result<ArbiterVerdict, ClassifyError> {
        Ok(ArbiterVerdict {
            is_documentation: false,
            confidence: 0.0,
            reasoning: "no arbiter configured".to_string(),
        })
    }
}
