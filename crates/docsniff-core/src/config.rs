use std::time::Duration;

/// Tunables for a classification engine.
///
/// Everything has a working default; the builder methods override
/// selectively. Thresholds are clamped into [0, 1] on the way in.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Arbiter model identifier (OpenAI-compatible).
    pub model: String,
    /// Cap on arbiter output tokens.
    pub max_output_tokens: u32,
    /// Arbiter sampling temperature.
    pub temperature: f32,
    /// Outbound request budget per one-minute window. Zero disables the
    /// limit.
    pub requests_per_minute: u32,
    /// How long classification results stay cached. Zero disables caching.
    pub cache_ttl: Duration,
    /// Fetched content larger than this is treated as a fetch failure.
    pub max_content_bytes: usize,
    /// Local confidence at or above this skips the arbiter.
    pub local_confidence_threshold: f64,
    /// Arbiter verdicts below this self-reported confidence are ignored.
    pub min_arbiter_confidence: f64,
    /// Timeout applied to outbound fetch and arbiter requests.
    pub request_timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_output_tokens: 500,
            temperature: 0.0,
            requests_per_minute: 30,
            cache_ttl: Duration::from_secs(3600),
            max_content_bytes: 2 * 1024 * 1024,
            local_confidence_threshold: 0.75,
            min_arbiter_confidence: 0.7,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClassifierConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_max_content_bytes(mut self, max_content_bytes: usize) -> Self {
        self.max_content_bytes = max_content_bytes;
        self
    }

    pub fn with_local_confidence_threshold(mut self, threshold: f64) -> Self {
        self.local_confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_arbiter_confidence(mut self, threshold: f64) -> Self {
        self.min_arbiter_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ClassifierConfig::default();
        assert!(!config.model.is_empty());
        assert!(config.local_confidence_threshold > 0.5);
        assert!(config.min_arbiter_confidence > 0.0);
        assert!(!config.cache_ttl.is_zero());
    }

    #[test]
    fn thresholds_are_clamped() {
        let config = ClassifierConfig::default()
            .with_local_confidence_threshold(1.5)
            .with_min_arbiter_confidence(-0.2);
        assert_eq!(config.local_confidence_threshold, 1.0);
        assert_eq!(config.min_arbiter_confidence, 0.0);
    }

    #[test]
    fn builders_compose() {
        let config = ClassifierConfig::default()
            .with_model("gpt-4o")
            .with_requests_per_minute(5)
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.requests_per_minute, 5);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }
}
