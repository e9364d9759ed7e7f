//! Configuration, prompt template, and the article summarization pipeline.

pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod summarizer;
pub mod vault;

pub use summarizer::{RunResult, Summarizer};
