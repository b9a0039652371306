use std::time::Duration;

use docsniff_core::error::ClassifyError;
use docsniff_core::traits::Fetcher;
use reqwest::Client;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_BYTES: usize = 2 * 1024 * 1024;
const USER_AGENT: &str = concat!(
    "docsniff/",
    env!("CARGO_PKG_VERSION"),
    " (documentation classifier)"
);

/// Content types we can analyze. Anything else (images, archives, video)
/// is rejected before the body is read.
const TEXT_CONTENT_TYPES: &[&str] = &[
    "text/html",
    "text/plain",
    "text/markdown",
    "application/xhtml",
];

/// HTTP fetcher using reqwest.
///
/// Downloads page content with a bounded timeout, a bounded body size, and
/// an identifying User-Agent. Non-http(s) schemes and non-text content
/// types are rejected up front; redirects are followed up to five hops.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ClassifyError> {
        Self::with_limits(DEFAULT_TIMEOUT, DEFAULT_MAX_BYTES)
    }

    pub fn with_limits(timeout: Duration, max_bytes: usize) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ClassifyError::Http(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
            max_bytes,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ClassifyError> {
        check_scheme(url)?;

        let mut response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ClassifyError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ClassifyError::Network(format!("connection failed: {e}"))
            } else {
                ClassifyError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Http(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !is_text_content(&content_type) {
            return Err(ClassifyError::UnsupportedContent(content_type));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(ClassifyError::OversizeResponse {
                    limit: self.max_bytes,
                });
            }
        }

        // Read in chunks; a missing Content-Length must not bypass the
        // size cap.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ClassifyError::Http(format!("failed to read response body: {e}")))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(ClassifyError::OversizeResponse {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Only http and https URLs are fetched.
fn check_scheme(url: &str) -> Result<(), ClassifyError> {
    let parsed = Url::parse(url).map_err(|e| ClassifyError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ClassifyError::Http(format!(
            "URL scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}

/// Servers frequently omit the header; an empty content type is tolerated.
fn is_text_content(content_type: &str) -> bool {
    content_type.is_empty() || TEXT_CONTENT_TYPES.iter().any(|t| content_type.starts_with(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_schemes_pass() {
        assert!(check_scheme("http://example.com/docs").is_ok());
        assert!(check_scheme("https://example.com/docs").is_ok());
    }

    #[test]
    fn other_schemes_are_rejected() {
        let result = check_scheme("file:///etc/passwd");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not allowed"));

        assert!(check_scheme("ftp://example.com/readme").is_err());
        assert!(check_scheme("javascript:alert(1)").is_err());
    }

    #[test]
    fn malformed_urls_are_invalid() {
        assert!(matches!(
            check_scheme("not a url"),
            Err(ClassifyError::InvalidUrl(_))
        ));
    }

    #[test]
    fn text_content_types_are_accepted() {
        assert!(is_text_content("text/html"));
        assert!(is_text_content("text/html; charset=utf-8"));
        assert!(is_text_content("text/markdown"));
        assert!(is_text_content("application/xhtml+xml"));
        assert!(is_text_content(""));
    }

    #[test]
    fn binary_content_types_are_rejected() {
        assert!(!is_text_content("application/pdf"));
        assert!(!is_text_content("image/png"));
        assert!(!is_text_content("application/octet-stream"));
    }

    #[test]
    fn user_agent_identifies_the_tool() {
        assert!(USER_AGENT.starts_with("docsniff/"));
    }
}
