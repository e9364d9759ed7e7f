//! Article documents: loading from the web, HTML text extraction, and chunking.

pub mod error;
pub mod loader;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
#[cfg(feature = "mock")]
pub use loader::MockLoader;
pub use loader::{WebLoader, WebLoaderConfig};
pub use splitter::{SplitMode, SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata};

/// Default maximum response body size: 10 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Boxed future returned by [`DocumentLoader::load`].
pub type LoadFuture<'a> = std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + 'a>,
>;

/// Retrieves the documents behind a URL.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, url: &str) -> LoadFuture<'_>;
}
