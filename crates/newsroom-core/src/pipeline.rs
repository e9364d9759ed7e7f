//! Generation over fetched documents: split, join, fill the prompt, ask the model.

use newsroom_document::{Chunk, Document, SplitterConfig, TextSplitter};
use newsroom_llm::provider::{LlmProvider, Message};

use crate::prompt::PromptTemplate;

/// Separator placed between chunk texts in the prompt context.
pub const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Llm(#[from] newsroom_llm::LlmError),
}

/// Turns the documents of one run into a single consolidated article.
///
/// Every document goes into one prompt; the model is called exactly once.
pub struct GenerationPipeline<P> {
    splitter: TextSplitter,
    template: PromptTemplate,
    provider: P,
}

impl<P: LlmProvider> GenerationPipeline<P> {
    /// Default 1000/200 character chunks and the built-in editor prompt.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            splitter: TextSplitter::new(SplitterConfig::default()),
            template: PromptTemplate::default(),
            provider,
        }
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Llm` if the model request fails.
    pub async fn run(&self, documents: &[Document]) -> Result<String, PipelineError> {
        let chunks = self.splitter.split_documents(documents);
        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "split documents"
        );

        let prompt = self.template.render(&join_chunks(&chunks));
        self.generate(prompt).await
    }

    async fn generate(&self, prompt: String) -> Result<String, PipelineError> {
        tracing::info!(
            provider = self.provider.name(),
            model = self.provider.model().unwrap_or("default"),
            prompt_chars = prompt.chars().count(),
            "requesting article from model"
        );
        let article = self.provider.chat(&[Message::user(prompt)]).await?;
        tracing::debug!(article_chars = article.chars().count(), "model replied");
        Ok(article)
    }
}

/// Concatenate chunk texts in order, separated by a blank line.
#[must_use]
pub fn join_chunks(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}
