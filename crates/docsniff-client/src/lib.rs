pub mod arbiter;
pub mod extractor;
pub mod fetcher;

pub use arbiter::OpenAiArbiter;
pub use extractor::ScraperExtractor;
pub use fetcher::HttpFetcher;
