//! Test-only loader with canned responses per URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Document, DocumentError, DocumentLoader, LoadFuture};

#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    responses: HashMap<String, Result<Vec<Document>, String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve one plain-text document for `url`.
    #[must_use]
    pub fn with_document(self, url: impl Into<String>, content: impl Into<String>) -> Self {
        let url = url.into();
        let doc = Document::new(content, url.clone());
        self.with_documents(url, vec![doc])
    }

    #[must_use]
    pub fn with_documents(mut self, url: impl Into<String>, documents: Vec<Document>) -> Self {
        self.responses.insert(url.into(), Ok(documents));
        self
    }

    /// Fail loading `url` with `cause` as the error message.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, cause: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Err(cause.into()));
        self
    }

    /// URLs passed to `load`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DocumentLoader for MockLoader {
    fn load(&self, url: &str) -> LoadFuture<'_> {
        self.calls.lock().unwrap().push(url.to_owned());
        let result = match self.responses.get(url) {
            Some(Ok(docs)) => Ok(docs.clone()),
            Some(Err(cause)) => Err(DocumentError::Other(cause.clone())),
            None => Err(DocumentError::Other(format!("no mock response for {url}"))),
        };
        Box::pin(async move { result })
    }
}
