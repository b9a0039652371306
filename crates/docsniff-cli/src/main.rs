use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docsniff_client::{HttpFetcher, OpenAiArbiter, ScraperExtractor};
use docsniff_core::{
    Arbiter, ClassificationEngine, ClassificationResult, ClassifierConfig, FeatureExtractor,
    Fetcher, NullArbiter,
};

#[derive(Parser)]
#[command(
    name = "docsniff",
    version,
    about = "Decides whether URLs point to technical documentation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single URL
    Check {
        /// Target URL to classify
        url: String,

        /// Print the full result as JSON instead of a summary line
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        options: EngineOptions,
    },

    /// Classify every URL in a file (one per line, `#` comments allowed)
    Batch {
        /// Path to the URL list
        #[arg(short, long)]
        input: PathBuf,

        /// Output format for the results on stdout
        #[arg(long, value_enum, default_value = "jsonl")]
        format: BatchFormat,

        #[command(flatten)]
        options: EngineOptions,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum BatchFormat {
    Jsonl,
    Csv,
}

/// Engine and arbiter knobs shared by both commands.
#[derive(Args)]
struct EngineOptions {
    /// Arbiter model to use (e.g., "gpt-4o-mini", "gemini-2.5-flash")
    #[arg(long, env = "DOCSNIFF_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// API key for the arbiter (omit together with --no-arbiter)
    #[arg(long, env = "DOCSNIFF_API_KEY")]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(
        long,
        env = "DOCSNIFF_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    base_url: String,

    /// Run heuristics only, never consulting the arbiter
    #[arg(long, default_value_t = false)]
    no_arbiter: bool,

    /// Outbound request budget per minute (0 = unlimited)
    #[arg(long, default_value_t = 30)]
    rpm: u32,

    /// Result cache TTL in seconds (0 disables caching)
    #[arg(long, default_value_t = 3600)]
    cache_ttl: u64,

    /// Local confidence at or above which the arbiter is skipped
    #[arg(long, default_value_t = 0.75)]
    threshold: f64,

    /// Minimum arbiter self-reported confidence to accept its verdict
    #[arg(long, default_value_t = 0.7)]
    min_arbiter_confidence: f64,

    /// Timeout in seconds for fetches and arbiter calls
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Maximum fetched page size in bytes
    #[arg(long, default_value_t = 2 * 1024 * 1024)]
    max_bytes: usize,
}

impl EngineOptions {
    fn to_config(&self) -> ClassifierConfig {
        ClassifierConfig::default()
            .with_model(&self.model)
            .with_requests_per_minute(self.rpm)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl))
            .with_local_confidence_threshold(self.threshold)
            .with_min_arbiter_confidence(self.min_arbiter_confidence)
            .with_request_timeout(Duration::from_secs(self.timeout))
            .with_max_content_bytes(self.max_bytes)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("docsniff_core=info".parse()?)
                .add_directive("docsniff_client=info".parse()?)
                .add_directive("docsniff_cli=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { url, json, options } => cmd_check(&url, json, &options).await,
        Commands::Batch {
            input,
            format,
            options,
        } => cmd_batch(&input, format, &options).await,
    }
}

async fn cmd_check(url: &str, json: bool, options: &EngineOptions) -> Result<()> {
    let config = options.to_config();
    let fetcher = HttpFetcher::with_limits(config.request_timeout, config.max_content_bytes)
        .map_err(|e| anyhow::anyhow!(e))?;
    let extractor = ScraperExtractor::new();

    let result = match build_arbiter(options, &config)? {
        Some(arbiter) => {
            let engine = ClassificationEngine::with_arbiter(fetcher, extractor, arbiter, config);
            engine.classify(url).await
        }
        None => {
            let engine = ClassificationEngine::<_, _, NullArbiter>::new(fetcher, extractor, config);
            engine.classify(url).await
        }
    };

    print_result(&result, json)
}

async fn cmd_batch(input: &Path, format: BatchFormat, options: &EngineOptions) -> Result<()> {
    let urls = read_url_file(input)?;
    if urls.is_empty() {
        println!("No URLs found in {}", input.display());
        return Ok(());
    }
    tracing::info!(count = urls.len(), "classifying URL list");

    let config = options.to_config();
    let fetcher = HttpFetcher::with_limits(config.request_timeout, config.max_content_bytes)
        .map_err(|e| anyhow::anyhow!(e))?;
    let extractor = ScraperExtractor::new();

    let results = match build_arbiter(options, &config)? {
        Some(arbiter) => {
            let engine = ClassificationEngine::with_arbiter(fetcher, extractor, arbiter, config);
            classify_all(&engine, &urls).await
        }
        None => {
            let engine = ClassificationEngine::<_, _, NullArbiter>::new(fetcher, extractor, config);
            classify_all(&engine, &urls).await
        }
    };

    match format {
        BatchFormat::Jsonl => {
            for result in &results {
                println!("{}", serde_json::to_string(result)?);
            }
        }
        BatchFormat::Csv => write_csv(&results)?,
    }

    let documentation = results.iter().filter(|r| r.is_documentation).count();
    tracing::info!(
        total = results.len(),
        documentation,
        "batch classification complete"
    );
    Ok(())
}

/// Build the configured arbiter, or `None` for heuristics-only runs.
fn build_arbiter(
    options: &EngineOptions,
    config: &ClassifierConfig,
) -> Result<Option<OpenAiArbiter>> {
    if options.no_arbiter {
        return Ok(None);
    }
    let Some(api_key) = options.api_key.as_deref() else {
        anyhow::bail!(
            "no API key configured: set DOCSNIFF_API_KEY (or --api-key), \
             or pass --no-arbiter to run heuristics only"
        );
    };
    let arbiter = OpenAiArbiter::from_config(api_key, config)
        .map_err(|e| anyhow::anyhow!(e))?
        .with_base_url(&options.base_url);
    Ok(Some(arbiter))
}

async fn classify_all<F, X, A>(
    engine: &ClassificationEngine<F, X, A>,
    urls: &[String],
) -> Vec<ClassificationResult>
where
    F: Fetcher,
    X: FeatureExtractor,
    A: Arbiter,
{
    let mut results = Vec::with_capacity(urls.len());
    for url in urls {
        tracing::info!(%url, "classifying");
        results.push(engine.classify(url).await);
    }
    results
}

/// One URL per line; blank lines and `#` comments are skipped.
fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL file: {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn print_result(result: &ClassificationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let verdict = if result.is_documentation {
        "documentation"
    } else {
        "not documentation"
    };
    println!(
        "{}: {} (confidence {:.2}, via {})",
        result.url, verdict, result.confidence, result.source
    );
    for item in &result.evidence {
        println!("  [{:+}] {}", item.score, item.reason);
    }
    Ok(())
}

fn write_csv(results: &[ClassificationResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["url", "is_documentation", "confidence", "source", "total_score"])?;
    for result in results {
        let confidence = format!("{:.3}", result.confidence);
        let total_score = result.total_score.to_string();
        writer.write_record([
            result.url.as_str(),
            if result.is_documentation { "true" } else { "false" },
            confidence.as_str(),
            result.source.as_str(),
            total_score.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_file_skips_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(
            &path,
            "https://a.example/docs\n\n# a comment\n  https://b.example/guide  \n",
        )
        .unwrap();

        let urls = read_url_file(&path).unwrap();
        assert_eq!(urls, vec!["https://a.example/docs", "https://b.example/guide"]);
    }

    #[test]
    fn missing_url_file_is_an_error() {
        let result = read_url_file(Path::new("/nonexistent/urls.txt"));
        assert!(result.is_err());
    }
}
