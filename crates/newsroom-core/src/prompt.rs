//! The editor prompt sent to the model.

/// Placeholder replaced by the joined chunk text.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

pub const DEFAULT_TEMPLATE: &str = "\
You are a professional news editor and journalist. Your task is to create a consolidated
news article based on the following sources.

SOURCES:
{context}

Follow these guidelines to create a proper news article:
1. Inverted pyramid structure, most important information first
2. Compelling headline
3. Byline \"AI News Summarizer\"
4. Lead paragraph covering who/what/when/where/why/how
5. Supporting details and background
6. Conclusion with context or future implications
7. Objective, journalistic tone
8. Include significant quotes from original articles
9. Synthesize across all sources
10. Output formatted in markdown

CONSOLIDATED NEWS ARTICLE:";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt template must contain {{context}}")]
    MissingPlaceholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

impl PromptTemplate {
    /// # Errors
    ///
    /// Returns [`PromptError::MissingPlaceholder`] if `template` lacks `{context}`.
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        if !template.contains(CONTEXT_PLACEHOLDER) {
            return Err(PromptError::MissingPlaceholder);
        }
        Ok(Self { template })
    }

    /// Substitute `context` for every `{context}` in the template.
    #[must_use]
    pub fn render(&self, context: &str) -> String {
        self.template.replace(CONTEXT_PLACEHOLDER, context)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }
}
