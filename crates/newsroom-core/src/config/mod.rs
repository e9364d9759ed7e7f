mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::prompt::PromptTemplate;
use crate::vault::{API_KEY_VARS, VaultProvider};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. Unparsable
    /// overrides are skipped and described in `env_warnings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.splitter.chunk_size == 0 {
            bail!("splitter.chunk_size must be greater than 0");
        }
        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            bail!(
                "splitter.chunk_overlap ({}) must be less than splitter.chunk_size ({})",
                self.splitter.chunk_overlap,
                self.splitter.chunk_size
            );
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            );
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.llm.timeout == 0 || self.fetch.timeout == 0 {
            bail!("timeouts must be greater than 0");
        }
        self.prompt_template()?;
        Ok(())
    }

    /// The configured prompt, or the built-in editor prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if a custom template lacks the `{context}` placeholder.
    pub fn prompt_template(&self) -> anyhow::Result<PromptTemplate> {
        match self.prompt.template {
            Some(ref t) => PromptTemplate::new(t.as_str()).context("invalid prompt.template"),
            None => Ok(PromptTemplate::default()),
        }
    }

    /// Look up the API key under [`API_KEY_VARS`]. A key already set is kept
    /// when the vault has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(key) = vault
            .first_of(&API_KEY_VARS)
            .context("failed to read API key")?
        {
            self.secrets.openai_api_key = Some(key);
        }
        Ok(())
    }
}
