#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("blocked: {0}")]
    Blocked(String),

    #[error("DNS lookup failed for {host}: {source}")]
    Dns {
        host: String,
        source: std::io::Error,
    },

    #[error("too many redirects (max {0})")]
    TooManyRedirects(usize),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("response too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    #[error("invalid UTF-8 in response body: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("no extractable text")]
    Empty,

    #[error("{0}")]
    Other(String),
}
