pub mod cache;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod models;
pub mod rate_limit;
pub mod testutil;
pub mod traits;
pub mod url_pattern;
pub mod util;

pub use config::ClassifierConfig;
pub use engine::ClassificationEngine;
pub use error::ClassifyError;
pub use evidence::{Evidence, aggregate};
pub use models::{ClassificationResult, ResultSource, UrlCategory};
pub use traits::{Arbiter, FeatureExtractor, Fetcher, NullArbiter};
