use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use newsroom_core::config::Config;
use newsroom_core::vault::EnvVaultProvider;
use newsroom_core::{RunResult, Summarizer};
use newsroom_llm::openai::OpenAiProvider;
use tokio::io::AsyncReadExt;

/// Fetch news articles and write one consolidated article with an LLM.
#[derive(Parser, Debug)]
#[command(name = "newsroom", version, about, long_about = None)]
struct Cli {
    /// Article URLs to summarize.
    urls: Vec<String>,

    /// Read more URLs from a file, one per line (`-` for stdin).
    #[arg(short = 'f', long)]
    urls_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        env = "NEWSROOM_CONFIG",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    /// Write the result to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override `llm.model`.
    #[arg(long)]
    model: Option<String>,

    /// Override `llm.temperature`.
    #[arg(long)]
    temperature: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    init_subscriber(&config.logging.level);
    for warning in config.env_warnings.drain(..) {
        tracing::warn!("{warning}");
    }

    apply_cli_overrides(&mut config, &cli);
    config.validate()?;
    config.resolve_secrets(&EnvVaultProvider)?;

    let urls = collect_urls(&cli).await?;
    if urls.is_empty() {
        tracing::warn!("no URLs given");
    }

    let provider = create_provider(&config)?;
    let summarizer = Summarizer::from_config(&config, provider)?;
    let result = summarizer.summarize(&urls).await;

    if cli.format == OutputFormat::Markdown {
        for error in &result.errors {
            eprintln!("{error}");
        }
    }
    if let Some(rendered) = render(&result, cli.format)? {
        match cli.output {
            Some(ref path) => std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => println!("{rendered}"),
        }
    }

    if result.summary.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_subscriber(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref model) = cli.model {
        config.llm.model.clone_from(model);
    }
    if let Some(temperature) = cli.temperature {
        config.llm.temperature = temperature;
    }
}

fn create_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let api_key = config
        .secrets
        .openai_api_key
        .as_ref()
        .context("OpenAI API key not found: set NEWSROOM_OPENAI_API_KEY or OPENAI_API_KEY")?;

    Ok(OpenAiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
    )
    .with_timeout(Duration::from_secs(config.llm.timeout))
    .with_temperature(config.llm.temperature)
    .with_max_tokens(config.llm.max_tokens))
}

async fn collect_urls(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut urls = cli.urls.clone();
    if let Some(ref path) = cli.urls_file {
        let text = if path.as_os_str() == "-" {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read URLs from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read URL file {}", path.display()))?
        };
        urls.extend(parse_url_list(&text));
    }
    Ok(urls)
}

/// One URL per line; blank lines and `#` comments are dropped.
fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// `None` means there is nothing to write: markdown output without a summary.
fn render(result: &RunResult, format: OutputFormat) -> anyhow::Result<Option<String>> {
    match format {
        OutputFormat::Markdown => Ok(result.summary.clone()),
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map(Some)
            .context("failed to serialize result"),
    }
}
