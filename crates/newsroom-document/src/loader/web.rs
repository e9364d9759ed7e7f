use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    DEFAULT_MAX_BODY_BYTES, Document, DocumentError, DocumentLoader, DocumentMetadata, LoadFuture,
};

const CONTENT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, blockquote, pre";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebLoaderConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Permit loopback, private and link-local hosts.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_user_agent() -> String {
    concat!("newsroom/", env!("CARGO_PKG_VERSION")).to_owned()
}

impl Default for WebLoaderConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
        }
    }
}

/// Fetches a page over HTTP(S) and extracts its article text with `scrape-core`.
#[derive(Debug)]
pub struct WebLoader {
    client: reqwest::Client,
    max_body_bytes: usize,
    allow_private_hosts: bool,
}

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

impl WebLoader {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, for example when
    /// `user_agent` is not a valid header value.
    pub fn new(config: &WebLoaderConfig) -> Result<Self, DocumentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// GET `url`, following redirects here so every hop passes the host checks.
    async fn get(&self, url: &str) -> Result<reqwest::Response, DocumentError> {
        let mut target = validate_url(url, self.allow_private_hosts)?;

        for _ in 0..=MAX_REDIRECTS {
            if !self.allow_private_hosts {
                ensure_public_addrs(&target).await?;
            }

            let resp = self.client.get(target.clone()).send().await?;
            if !resp.status().is_redirection() {
                return Ok(resp);
            }

            let Some(location) = resp
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Err(DocumentError::Status(resp.status()));
            };
            let next = next_hop(&target, location, self.allow_private_hosts)?;
            tracing::debug!(from = %target, to = %next, "following redirect");
            target = next;
        }

        Err(DocumentError::TooManyRedirects(MAX_REDIRECTS))
    }

    async fn fetch(&self, url: &str) -> Result<Document, DocumentError> {
        let resp = self.get(url).await?;

        if !resp.status().is_success() {
            return Err(DocumentError::Status(resp.status()));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(mime_essence);
        let kind = BodyKind::classify(content_type.as_deref())?;

        if let Some(len) = resp.content_length()
            && usize::try_from(len).map_or(true, |len| len > self.max_body_bytes)
        {
            return Err(DocumentError::TooLarge {
                size: usize::try_from(len).unwrap_or(usize::MAX),
                max: self.max_body_bytes,
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.len() > self.max_body_bytes {
            return Err(DocumentError::TooLarge {
                size: bytes.len(),
                max: self.max_body_bytes,
            });
        }
        let body = String::from_utf8(bytes.to_vec())?;

        let mut metadata = DocumentMetadata {
            source: url.to_owned(),
            content_type: content_type.unwrap_or_else(|| "text/html".to_owned()),
            ..DocumentMetadata::default()
        };

        let content = match kind {
            BodyKind::Html => {
                let article = tokio::task::spawn_blocking(move || extract_article(&body))
                    .await
                    .map_err(|e| DocumentError::Other(e.to_string()))??;
                metadata.title = article.title;
                metadata.description = article.description;
                metadata.language = article.language;
                article.text
            }
            BodyKind::Text => body,
        };

        if content.trim().is_empty() {
            return Err(DocumentError::Empty);
        }

        tracing::debug!(
            url,
            chars = content.chars().count(),
            title = metadata.title.as_deref().unwrap_or(""),
            "loaded article"
        );

        Ok(Document { content, metadata })
    }
}

impl DocumentLoader for WebLoader {
    fn load(&self, url: &str) -> LoadFuture<'_> {
        let url = url.to_owned();
        Box::pin(async move { Ok(vec![self.fetch(&url).await?]) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Html,
    Text,
}

impl BodyKind {
    fn classify(content_type: Option<&str>) -> Result<Self, DocumentError> {
        match content_type {
            None | Some("text/html" | "application/xhtml+xml") => Ok(Self::Html),
            Some("text/plain" | "text/markdown") => Ok(Self::Text),
            Some(ct) => Err(DocumentError::UnsupportedContent(ct.to_owned())),
        }
    }
}

fn mime_essence(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn validate_url(raw: &str, allow_private_hosts: bool) -> Result<Url, DocumentError> {
    let parsed = Url::parse(raw).map_err(|e| DocumentError::InvalidUrl(format!("{raw}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DocumentError::Blocked(format!(
            "scheme not allowed: {}",
            parsed.scheme()
        )));
    }

    if !allow_private_hosts
        && let Some(host) = parsed.host()
        && is_private_host(&host)
    {
        return Err(DocumentError::Blocked(format!(
            "private/local host: {}",
            parsed.host_str().unwrap_or("")
        )));
    }

    Ok(parsed)
}

/// Resolve `location` against the current URL and check the new target.
fn next_hop(
    current: &Url,
    location: &str,
    allow_private_hosts: bool,
) -> Result<Url, DocumentError> {
    let next = current
        .join(location)
        .map_err(|e| DocumentError::InvalidUrl(format!("redirect to {location}: {e}")))?;
    validate_url(next.as_str(), allow_private_hosts)
}

/// Reject domain names that resolve to a private address.
async fn ensure_public_addrs(url: &Url) -> Result<(), DocumentError> {
    let Some(url::Host::Domain(host)) = url.host() else {
        return Ok(());
    };
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| DocumentError::Dns {
            host: host.to_owned(),
            source,
        })?;
    for addr in addrs {
        if is_private_ip(addr.ip()) {
            return Err(DocumentError::Blocked(format!(
                "{host} resolves to private address {}",
                addr.ip()
            )));
        }
    }
    Ok(())
}

fn is_private_host(host: &url::Host<&str>) -> bool {
    match host {
        url::Host::Domain(d) => *d == "localhost" || d.ends_with(".localhost"),
        url::Host::Ipv4(v4) => is_private_ip(IpAddr::V4(*v4)),
        url::Host::Ipv6(v6) => is_private_ip(IpAddr::V6(*v6)),
    }
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            let seg = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                // fe80::/10 link-local
                || seg[0] & 0xffc0 == 0xfe80
                // fc00::/7 unique local
                || seg[0] & 0xfe00 == 0xfc00
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}

/// Text and metadata pulled out of an HTML page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub text: String,
}

/// Extract title, description, language and readable text from HTML.
///
/// Text comes from headings, paragraphs, list items, quotes and preformatted
/// blocks in document order, one per line. Pages with none of those fall back
/// to the text of `<body>`.
///
/// # Errors
///
/// Returns an error if a selector cannot be evaluated.
pub fn extract_article(html: &str) -> Result<ExtractedArticle, DocumentError> {
    let soup = scrape_core::Soup::parse(html);
    let select = |selector: &str| {
        soup.find_all(selector)
            .map_err(|e| DocumentError::Other(format!("invalid selector {selector}: {e}")))
    };

    let first_text = |selector: &str| -> Result<Option<String>, DocumentError> {
        Ok(select(selector)?
            .into_iter()
            .map(|tag| normalize_whitespace(&tag.text()))
            .find(|t| !t.is_empty()))
    };
    let first_attr = |selector: &str, attr: &str| -> Result<Option<String>, DocumentError> {
        Ok(select(selector)?
            .into_iter()
            .filter_map(|tag| tag.get(attr).map(normalize_whitespace))
            .find(|t| !t.is_empty()))
    };

    let title = match first_text("title")? {
        Some(t) => Some(t),
        None => first_attr("meta[property=\"og:title\"]", "content")?,
    };
    let description = match first_attr("meta[name=\"description\"]", "content")? {
        Some(d) => Some(d),
        None => first_attr("meta[property=\"og:description\"]", "content")?,
    };
    let language = first_attr("html", "lang")?;

    let mut lines: Vec<String> = Vec::new();
    for tag in select(CONTENT_SELECTOR)? {
        let line = normalize_whitespace(&tag.text());
        if line.is_empty() || lines.last() == Some(&line) {
            continue;
        }
        lines.push(line);
    }

    let text = if lines.is_empty() {
        first_text("body")?.unwrap_or_default()
    } else {
        lines.join("\n")
    };

    Ok(ExtractedArticle {
        title,
        description,
        language,
        text,
    })
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>  Storm hits
     coast </title>
  <meta name="description" content="A storm made landfall overnight.">
  <script>var tracking = "ignore me";</script>
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <article>
    <h1>Storm hits coast</h1>
    <p>The storm made landfall at 3 a.m.</p>
    <blockquote>"We were ready," the mayor said.</blockquote>
    <ul><li>Power outages reported</li></ul>
  </article>
</body>
</html>"#;

    fn loader() -> WebLoader {
        WebLoader::new(&WebLoaderConfig {
            allow_private_hosts: true,
            ..WebLoaderConfig::default()
        })
        .unwrap()
    }

    // --- extract_article ---

    #[test]
    fn extracts_metadata() {
        let article = extract_article(ARTICLE_HTML).unwrap();
        assert_eq!(article.title.as_deref(), Some("Storm hits coast"));
        assert_eq!(
            article.description.as_deref(),
            Some("A storm made landfall overnight.")
        );
        assert_eq!(article.language.as_deref(), Some("en"));
    }

    #[test]
    fn extracts_content_in_document_order() {
        let article = extract_article(ARTICLE_HTML).unwrap();
        let lines: Vec<&str> = article.text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Storm hits coast",
                "The storm made landfall at 3 a.m.",
                "\"We were ready,\" the mayor said.",
                "Power outages reported",
            ]
        );
        assert!(!article.text.contains("tracking"));
    }

    #[test]
    fn falls_back_to_og_tags() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG headline">
            <meta property="og:description" content="OG summary">
            </head><body><p>Body</p></body></html>"#;
        let article = extract_article(html).unwrap();
        assert_eq!(article.title.as_deref(), Some("OG headline"));
        assert_eq!(article.description.as_deref(), Some("OG summary"));
        assert!(article.language.is_none());
    }

    #[test]
    fn falls_back_to_body_text() {
        let html = "<html><body><div>Only a   div here</div></body></html>";
        let article = extract_article(html).unwrap();
        assert_eq!(article.text, "Only a div here");
    }

    #[test]
    fn empty_page_has_no_text() {
        let article = extract_article("<html><body></body></html>").unwrap();
        assert!(article.text.is_empty());
        assert!(article.title.is_none());
    }

    // --- content types ---

    #[test]
    fn classify_content_types() {
        assert_eq!(BodyKind::classify(None).unwrap(), BodyKind::Html);
        assert_eq!(
            BodyKind::classify(Some("text/html")).unwrap(),
            BodyKind::Html
        );
        assert_eq!(
            BodyKind::classify(Some("application/xhtml+xml")).unwrap(),
            BodyKind::Html
        );
        assert_eq!(
            BodyKind::classify(Some("text/plain")).unwrap(),
            BodyKind::Text
        );
        assert_eq!(
            BodyKind::classify(Some("text/markdown")).unwrap(),
            BodyKind::Text
        );
        for ct in ["image/png", "text/css", "text/javascript", "text/csv"] {
            assert!(
                matches!(
                    BodyKind::classify(Some(ct)),
                    Err(DocumentError::UnsupportedContent(ref got)) if got == ct
                ),
                "{ct} should be rejected"
            );
        }
    }

    #[test]
    fn mime_essence_strips_parameters() {
        assert_eq!(mime_essence("Text/HTML; charset=UTF-8"), "text/html");
    }

    // --- validate_url ---

    #[test]
    fn invalid_url_rejected() {
        assert!(matches!(
            validate_url("not a url", false),
            Err(DocumentError::InvalidUrl(_))
        ));
    }

    #[test]
    fn non_http_scheme_blocked() {
        assert!(matches!(
            validate_url("ftp://example.com/a", false),
            Err(DocumentError::Blocked(_))
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd", true),
            Err(DocumentError::Blocked(_))
        ));
    }

    #[test]
    fn http_and_https_allowed() {
        assert!(validate_url("http://example.com/a", false).is_ok());
        assert!(validate_url("https://example.com/a", false).is_ok());
    }

    #[test]
    fn private_hosts_blocked_by_default() {
        for url in [
            "http://localhost/a",
            "http://127.0.0.1/a",
            "http://10.0.0.1/a",
            "http://192.168.1.1/a",
            "http://169.254.169.254/latest",
            "http://[::1]/a",
            "http://[fe80::1]/a",
            "http://[fd00::1]/a",
            "http://[::ffff:127.0.0.1]/a",
        ] {
            assert!(
                matches!(validate_url(url, false), Err(DocumentError::Blocked(_))),
                "{url} should be blocked"
            );
        }
    }

    #[test]
    fn redirect_hop_resolves_relative_location() {
        let current = Url::parse("https://news.example/world/storm").unwrap();
        let next = next_hop(&current, "/world/storm-updated", false).unwrap();
        assert_eq!(next.as_str(), "https://news.example/world/storm-updated");
    }

    #[test]
    fn redirect_hop_to_private_host_blocked() {
        let current = Url::parse("https://news.example/a").unwrap();
        for location in [
            "http://169.254.169.254/latest/meta-data",
            "http://localhost:8080/admin",
            "http://[::1]/",
        ] {
            assert!(
                matches!(
                    next_hop(&current, location, false),
                    Err(DocumentError::Blocked(_))
                ),
                "{location} should be blocked"
            );
        }
        assert!(next_hop(&current, "http://169.254.169.254/", true).is_ok());
    }

    #[tokio::test]
    async fn hostname_resolving_to_loopback_blocked() {
        let url = Url::parse("http://localhost:8080/a").unwrap();
        let err = ensure_public_addrs(&url).await.unwrap_err();
        assert!(matches!(err, DocumentError::Blocked(ref m) if m.contains("resolves to")));
    }

    #[tokio::test]
    async fn ip_literal_skips_dns_check() {
        let url = Url::parse("http://93.184.216.34/a").unwrap();
        assert!(ensure_public_addrs(&url).await.is_ok());
    }

    #[test]
    fn private_hosts_allowed_when_configured() {
        assert!(validate_url("http://127.0.0.1:8080/a", true).is_ok());
    }

    // --- WebLoader ---

    #[tokio::test]
    async fn loads_html_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/storm"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string(ARTICLE_HTML),
            )
            .mount(&server)
            .await;

        let url = format!("{}/news/storm", server.uri());
        let docs = loader().load(&url).await.unwrap();
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.metadata.source, url);
        assert_eq!(doc.metadata.content_type, "text/html");
        assert_eq!(doc.metadata.title.as_deref(), Some("Storm hits coast"));
        assert_eq!(doc.metadata.language.as_deref(), Some("en"));
        assert!(doc.content.contains("landfall at 3 a.m."));
    }

    #[tokio::test]
    async fn loads_plain_text_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wire.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("Wire copy.\n\nSecond paragraph."),
            )
            .mount(&server)
            .await;

        let docs = loader()
            .load(&format!("{}/wire.txt", server.uri()))
            .await
            .unwrap();
        assert_eq!(docs[0].content, "Wire copy.\n\nSecond paragraph.");
        assert_eq!(docs[0].metadata.content_type, "text/plain");
        assert!(docs[0].metadata.title.is_none());
    }

    #[tokio::test]
    async fn http_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = loader()
            .load(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Status(s) if s.as_u16() == 404));
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
    }

    #[tokio::test]
    async fn binary_content_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(vec![0x25, 0x50, 0x44, 0x46]),
            )
            .mount(&server)
            .await;

        let err = loader()
            .load(&format!("{}/doc.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedContent(_)));
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("x".repeat(64)),
            )
            .mount(&server)
            .await;

        let loader = WebLoader::new(&WebLoaderConfig {
            max_body_bytes: 16,
            allow_private_hosts: true,
            ..WebLoaderConfig::default()
        })
        .unwrap();
        let err = loader
            .load(&format!("{}/big", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { max: 16, .. }));
    }

    #[tokio::test]
    async fn page_without_text_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><body>   </body></html>"),
            )
            .mount(&server)
            .await;

        let err = loader()
            .load(&format!("{}/blank", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Empty));
    }

    #[tokio::test]
    async fn local_server_blocked_without_opt_in() {
        let server = MockServer::start().await;
        let loader = WebLoader::new(&WebLoaderConfig::default()).unwrap();
        let err = loader
            .load(&format!("{}/a", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Blocked(_)));
    }

    #[test]
    fn invalid_user_agent_rejected() {
        let err = WebLoader::new(&WebLoaderConfig {
            user_agent: "bad\nagent".into(),
            ..WebLoaderConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, DocumentError::Http(_)));
    }

    #[tokio::test]
    async fn configured_timeout_applies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("late body")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let loader = WebLoader::new(&WebLoaderConfig {
            timeout: 1,
            allow_private_hosts: true,
            ..WebLoaderConfig::default()
        })
        .unwrap();
        let err = loader
            .load(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Http(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn redirect_followed_to_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/story/amp"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/story/amp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("Final copy."),
            )
            .mount(&server)
            .await;

        let url = format!("{}/story", server.uri());
        let docs = loader().load(&url).await.unwrap();
        assert_eq!(docs[0].content, "Final copy.");
        assert_eq!(docs[0].metadata.source, url);
    }

    #[tokio::test]
    async fn redirect_to_disallowed_scheme_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "file:///etc/passwd"),
            )
            .mount(&server)
            .await;

        let err = loader()
            .load(&format!("{}/a", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Blocked(_)));
    }

    #[tokio::test]
    async fn redirect_loop_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
            .expect(u64::try_from(MAX_REDIRECTS + 1).unwrap())
            .mount(&server)
            .await;

        let err = loader()
            .load(&format!("{}/loop", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::TooManyRedirects(5)));
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let err = loader().load("http://127.0.0.1:1/a").await.unwrap_err();
        assert!(matches!(err, DocumentError::Http(_)));
    }
}
