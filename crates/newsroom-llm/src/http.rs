//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Create an HTTP client for chat-completion requests.
///
/// Config: 30s connect timeout, `timeout` request timeout, rustls TLS,
/// `newsroom/{version}` user-agent, redirect limit 10.
///
/// Falls back to a default client when the builder rejects the configuration.
#[must_use]
pub fn default_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .user_agent(concat!("newsroom/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .unwrap_or_default()
}
