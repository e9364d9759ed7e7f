#[cfg(feature = "mock")]
mod mock;
mod web;

#[cfg(feature = "mock")]
pub use mock::MockLoader;
pub use web::{WebLoader, WebLoaderConfig, extract_article};
