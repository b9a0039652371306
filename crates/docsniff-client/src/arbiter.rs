use std::time::Duration;

use docsniff_core::config::ClassifierConfig;
use docsniff_core::error::ClassifyError;
use docsniff_core::models::{ArbiterRequest, ArbiterVerdict};
use docsniff_core::traits::Arbiter;
use docsniff_core::util::truncate_chars;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_ARBITER_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TEMPERATURE: f32 = 0.0;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;
/// Free-text samples are cut again before prompting; extraction already
/// bounds them, but the prompt must stay bounded even for hand-built
/// requests.
const MAX_PROMPT_SAMPLE_CHARS: usize = 2_000;

const SYSTEM_PROMPT: &str = "You judge whether a URL points to technical documentation.\n\
\n\
Documentation includes: API references, developer guides, tutorials, manuals, \
README-style usage instructions, project wikis, and generated documentation sites.\n\
\n\
Not documentation: product marketing, pricing or checkout pages, blog posts and \
news articles, issue trackers, forums, login or account pages, and general-purpose \
home pages.\n\
\n\
Weigh the structural signals you are given (they are heuristic, not ground truth) \
together with the URL itself. Respond ONLY with JSON matching the requested schema, \
with confidence expressing how sure you are of the verdict.";

/// OpenAI-compatible arbiter client.
///
/// Works with any OpenAI-compatible chat-completions API, including:
/// - OpenAI directly (`https://api.openai.com/v1`)
/// - Gemini via compatibility layer (`https://generativelanguage.googleapis.com/v1beta/openai`)
///
/// The verdict shape is enforced server-side through a strict JSON schema
/// response format and re-validated on parse.
#[derive(Clone)]
pub struct OpenAiArbiter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl OpenAiArbiter {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ClassifyError> {
        Self::build(
            api_key,
            model,
            DEFAULT_ARBITER_TIMEOUT,
            DEFAULT_TEMPERATURE,
            DEFAULT_MAX_OUTPUT_TOKENS,
        )
    }

    /// Construct from a [`ClassifierConfig`]'s arbiter settings.
    pub fn from_config(api_key: &str, config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        Self::build(
            api_key,
            &config.model,
            config.request_timeout,
            config.temperature,
            config.max_output_tokens,
        )
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn build(
        api_key: &str,
        model: &str,
        timeout: Duration,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Self, ClassifyError> {
        // A misconfigured arbiter should surface at construction, not on
        // the first weak-evidence URL.
        if api_key.trim().is_empty() {
            return Err(ClassifyError::Config("arbiter API key is empty".to_string()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| ClassifyError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            max_output_tokens,
            timeout,
        })
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaWrapper,
}

#[derive(Serialize)]
struct JsonSchemaWrapper {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn verdict_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "is_documentation": { "type": "boolean" },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "reasoning": { "type": "string" }
        },
        "required": ["is_documentation", "confidence", "reasoning"],
        "additionalProperties": false
    })
}

/// Flatten the request into the user prompt: URL, category, signed
/// evidence lines, and bounded feature renderings.
fn render_request(request: &ArbiterRequest) -> String {
    let mut prompt = format!("URL: {}\nCategory: {}\n", request.url, request.category);

    if request.evidence.is_empty() {
        prompt.push_str("\nNo URL or content signals were collected.\n");
    } else {
        prompt.push_str("\nCollected signals (signed heuristic scores):\n");
        for item in &request.evidence {
            prompt.push_str(&format!("- [{:+}] {}\n", item.score, item.reason));
        }
    }

    if let Some(page) = &request.page {
        prompt.push_str("\nPage features:\n");
        if let Some(title) = &page.title {
            prompt.push_str(&format!("- title: {title}\n"));
        }
        if let Some(description) = &page.meta_description {
            prompt.push_str(&format!("- description: {description}\n"));
        }
        if !page.headings.is_empty() {
            prompt.push_str(&format!("- headings: {}\n", page.headings.join(" | ")));
        }
        if page.has_sidebar {
            prompt.push_str(&format!(
                "- sidebar links: {}\n",
                page.sidebar_links.join(", ")
            ));
        }
        prompt.push_str(&format!(
            "- code blocks: {}, search box: {}, version selector: {}, pagination: {}\n",
            page.code_block_count,
            page.has_search_box,
            page.has_version_selector,
            page.has_pagination
        ));
        if !page.content_sample.is_empty() {
            prompt.push_str(&format!(
                "\nContent sample:\n\"\"\"\n{}\n\"\"\"\n",
                truncate_chars(&page.content_sample, MAX_PROMPT_SAMPLE_CHARS)
            ));
        }
    }

    if let Some(repo) = &request.repo {
        prompt.push_str("\nRepository listing:\n");
        prompt.push_str(&format!(
            "- {} entries, {} markdown files\n",
            repo.entries.len(),
            repo.markdown_file_count()
        ));
        let names: Vec<&str> = repo
            .entries
            .iter()
            .take(30)
            .map(|e| e.name.as_str())
            .collect();
        if !names.is_empty() {
            prompt.push_str(&format!("- entries: {}\n", names.join(", ")));
        }
        if !repo.readme_sample.is_empty() {
            prompt.push_str(&format!(
                "\nREADME sample:\n\"\"\"\n{}\n\"\"\"\n",
                truncate_chars(&repo.readme_sample, MAX_PROMPT_SAMPLE_CHARS)
            ));
        }
    }

    prompt.push_str("\nIs this URL technical documentation?\n");
    prompt
}

/// Parse the model's message content into a verdict. Any shape mismatch
/// is a schema error; out-of-range confidences are clamped, not rejected.
fn parse_verdict(content: &str) -> Result<ArbiterVerdict, ClassifyError> {
    let mut verdict: ArbiterVerdict = serde_json::from_str(content).map_err(|e| {
        ClassifyError::ArbiterSchema(format!("{e}; raw: {}", truncate_chars(content, 200)))
    })?;
    verdict.confidence = verdict.confidence.clamp(0.0, 1.0);
    Ok(verdict)
}

impl Arbiter for OpenAiArbiter {
    async fn judge(&self, request: &ArbiterRequest) -> Result<ArbiterVerdict, ClassifyError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: render_request(request),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaWrapper {
                    name: "documentation_verdict".to_string(),
                    strict: true,
                    schema: verdict_schema(),
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifyError::Timeout(self.timeout.as_secs())
                } else if e.is_connect() {
                    ClassifyError::Network(format!("connection failed: {e}"))
                } else {
                    ClassifyError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&raw)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {raw}"));
            return Err(ClassifyError::Arbiter {
                message,
                status_code,
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            ClassifyError::ArbiterSchema(format!("failed to parse chat response: {e}"))
        })?;
        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| ClassifyError::ArbiterSchema("empty response from model".to_string()))?;

        parse_verdict(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsniff_core::evidence::Evidence;
    use docsniff_core::models::{ListingEntry, PageFeatures, RepoFeatures, UrlCategory};

    fn sample_request() -> ArbiterRequest {
        ArbiterRequest {
            url: "https://example.com/widget".to_string(),
            category: UrlCategory::DedicatedDocSite,
            evidence: vec![
                Evidence::new(15, "documentation path segment /docs"),
                Evidence::new(-15, "commerce phrase \"buy now\" in page content"),
            ],
            page: Some(PageFeatures {
                title: Some("Widget".to_string()),
                content_sample: "A page about widgets.".to_string(),
                ..PageFeatures::default()
            }),
            repo: None,
        }
    }

    #[test]
    fn empty_api_key_fails_at_construction() {
        let result = OpenAiArbiter::new("", "gpt-4o-mini");
        assert!(matches!(result, Err(ClassifyError::Config(_))));

        let result = OpenAiArbiter::new("   ", "gpt-4o-mini");
        assert!(result.is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let arbiter = OpenAiArbiter::new("key", "gpt-4o-mini")
            .unwrap()
            .with_base_url("https://llm.internal/v1/");
        assert_eq!(arbiter.base_url, "https://llm.internal/v1");
    }

    #[test]
    fn builders_override_the_defaults() {
        let arbiter = OpenAiArbiter::new("key", "gpt-4o-mini")
            .unwrap()
            .with_timeout(Duration::from_secs(10))
            .with_temperature(0.3)
            .with_max_output_tokens(200);
        assert_eq!(arbiter.timeout, Duration::from_secs(10));
        assert_eq!(arbiter.temperature, 0.3);
        assert_eq!(arbiter.max_output_tokens, 200);
    }

    #[test]
    fn prompt_carries_url_evidence_and_sample() {
        let prompt = render_request(&sample_request());
        assert!(prompt.contains("URL: https://example.com/widget"));
        assert!(prompt.contains("Category: dedicated site"));
        assert!(prompt.contains("[+15] documentation path segment /docs"));
        assert!(prompt.contains("[-15] commerce phrase"));
        assert!(prompt.contains("title: Widget"));
        assert!(prompt.contains("A page about widgets."));
    }

    #[test]
    fn prompt_renders_repository_listings() {
        let request = ArbiterRequest {
            url: "https://github.com/widgetco/widget".to_string(),
            category: UrlCategory::RepositoryListing,
            evidence: Vec::new(),
            page: None,
            repo: Some(RepoFeatures {
                entries: vec![
                    ListingEntry::directory("docs"),
                    ListingEntry::file("README.md"),
                ],
                readme_sample: "Usage instructions.".to_string(),
            }),
        };
        let prompt = render_request(&request);
        assert!(prompt.contains("Category: repository listing"));
        assert!(prompt.contains("2 entries, 1 markdown files"));
        assert!(prompt.contains("docs, README.md"));
        assert!(prompt.contains("Usage instructions."));
        assert!(prompt.contains("No URL or content signals were collected."));
    }

    #[test]
    fn oversized_samples_are_truncated_in_the_prompt() {
        let mut request = sample_request();
        if let Some(page) = &mut request.page {
            page.content_sample = "x".repeat(10_000);
        }
        let prompt = render_request(&request);
        assert!(prompt.len() < 5_000);
    }

    #[test]
    fn well_formed_verdict_parses() {
        let verdict = parse_verdict(
            r#"{"is_documentation": true, "confidence": 0.82, "reasoning": "sidebar and API reference"}"#,
        )
        .unwrap();
        assert!(verdict.is_documentation);
        assert!((verdict.confidence - 0.82).abs() < f64::EPSILON);
        assert_eq!(verdict.reasoning, "sidebar and API reference");
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let verdict = parse_verdict(
            r#"{"is_documentation": false, "confidence": 1.7, "reasoning": "overconfident"}"#,
        )
        .unwrap();
        assert_eq!(verdict.confidence, 1.0);

        let verdict = parse_verdict(
            r#"{"is_documentation": false, "confidence": -3.0, "reasoning": "underconfident"}"#,
        )
        .unwrap();
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn malformed_verdicts_are_schema_errors() {
        assert!(matches!(
            parse_verdict("not json"),
            Err(ClassifyError::ArbiterSchema(_))
        ));
        assert!(matches!(
            parse_verdict(r#"{"is_documentation": "yes"}"#),
            Err(ClassifyError::ArbiterSchema(_))
        ));
        assert!(matches!(
            parse_verdict(r#"{"confidence": 0.9, "reasoning": "missing verdict"}"#),
            Err(ClassifyError::ArbiterSchema(_))
        ));
    }

    #[test]
    fn schema_requires_every_verdict_field() {
        let schema = verdict_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert_eq!(schema["additionalProperties"], serde_json::json!(false));
    }
}
