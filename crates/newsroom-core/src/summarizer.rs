//! Fetch a set of article URLs and synthesize one consolidated article.

use anyhow::Context;
use newsroom_document::{Document, DocumentLoader, TextSplitter, WebLoader};
use newsroom_llm::LlmProvider;
use serde::Serialize;

use crate::config::Config;
use crate::pipeline::GenerationPipeline;
use crate::prompt::PromptTemplate;

/// Outcome of one [`Summarizer::summarize`] call.
///
/// `errors` may be non-empty alongside a summary when only some URLs loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub summary: Option<String>,
    pub errors: Vec<String>,
}

/// Loads every URL in order, then chunks, prompts and generates once.
pub struct Summarizer<P> {
    loader: Box<dyn DocumentLoader>,
    pipeline: GenerationPipeline<P>,
}

impl<P: LlmProvider> Summarizer<P> {
    #[must_use]
    pub fn new(loader: impl DocumentLoader + 'static, provider: P) -> Self {
        Self {
            loader: Box::new(loader),
            pipeline: GenerationPipeline::new(provider),
        }
    }

    /// Build a summarizer backed by [`WebLoader`] from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured prompt template is invalid or the
    /// HTTP client cannot be built from `[fetch]`.
    pub fn from_config(config: &Config, provider: P) -> anyhow::Result<Self> {
        let loader = WebLoader::new(&config.fetch).context("invalid [fetch] settings")?;
        Ok(Self::new(loader, provider)
            .with_splitter(TextSplitter::new(config.splitter.clone()))
            .with_template(config.prompt_template()?))
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.pipeline = self.pipeline.with_splitter(splitter);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.pipeline = self.pipeline.with_template(template);
        self
    }

    /// Fetch `urls` one after another and summarize everything that loaded.
    ///
    /// Blank entries are skipped. A URL that fails to load adds
    /// `"Error loading {url}: {cause}"` to `errors`; a failed generation adds
    /// `"Summarization error: {cause}"`. Nothing is retried and this never fails
    /// as a whole.
    pub async fn summarize<S: AsRef<str>>(&self, urls: &[S]) -> RunResult {
        let mut result = RunResult::default();

        let documents = self.load_all(urls, &mut result.errors).await;
        if documents.is_empty() {
            tracing::info!(
                errors = result.errors.len(),
                "no documents loaded, nothing to summarize"
            );
            return result;
        }

        tracing::info!(documents = documents.len(), "summarizing loaded articles");
        match self.pipeline.run(&documents).await {
            Ok(summary) => result.summary = Some(summary),
            Err(e) => {
                tracing::error!("summarization failed: {e}");
                result.errors.push(format!("Summarization error: {e}"));
            }
        }

        result
    }

    async fn load_all<S: AsRef<str>>(
        &self,
        urls: &[S],
        errors: &mut Vec<String>,
    ) -> Vec<Document> {
        let mut documents = Vec::new();

        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }

            match self.loader.load(url).await {
                Ok(docs) => {
                    tracing::debug!(url, documents = docs.len(), "loaded");
                    documents.extend(docs.into_iter().map(|mut doc| {
                        doc.metadata.source = url.to_owned();
                        doc
                    }));
                }
                Err(e) => {
                    tracing::warn!(url, "failed to load article: {e}");
                    errors.push(format!("Error loading {url}: {e}"));
                }
            }
        }

        documents
    }
}
