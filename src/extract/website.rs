//! Website fetching and body text extraction.
//!
//! Only static HTML is supported; no JavaScript execution. Extraction is
//! restricted to the `<body>` subtree with script/style/navigation chrome
//! excluded, and the page `<title>` is captured for display.

use scraper::{Html, Selector};
use url::Url;

use crate::core::errors::ApiError;

/// Elements whose text is page chrome, not content.
const EXCLUDED_ELEMENTS: [&str; 7] = [
    "script", "style", "noscript", "nav", "header", "footer", "template",
];

#[derive(Debug)]
pub struct WebsitePage {
    pub title: Option<String>,
    pub text: String,
}

/// Fetch a page and reduce it to title + body text.
///
/// Network and HTTP-status failures map to reason `"fetch-failed"`; a page
/// whose body yields zero text maps to `"no-content"`.
pub async fn fetch(client: &reqwest::Client, url: &Url) -> Result<WebsitePage, ApiError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| fetch_failed(url, e))?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::warn!(%url, %status, "website fetch returned error status");
        return Err(ApiError::extraction(url.as_str(), "fetch-failed"));
    }

    let html = response.text().await.map_err(|e| fetch_failed(url, e))?;
    let page = parse_page(&html);

    if page.text.is_empty() {
        return Err(ApiError::extraction(url.as_str(), "no-content"));
    }

    tracing::info!(%url, chars = page.text.len(), title = ?page.title, "extracted website text");
    Ok(page)
}

/// Parse an HTML document into title + cleaned body text.
pub fn parse_page(html: &str) -> WebsitePage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document.select(&selector).next().and_then(|el| {
            let text = el.text().collect::<String>().trim().to_string();
            (!text.is_empty()).then_some(text)
        })
    });

    let mut raw = String::new();
    if let Ok(body_selector) = Selector::parse("body") {
        if let Some(body) = document.select(&body_selector).next() {
            for node in body.descendants() {
                let Some(text) = node.value().as_text() else {
                    continue;
                };
                let excluded = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| EXCLUDED_ELEMENTS.contains(&el.name()))
                });
                if !excluded {
                    raw.push_str(text);
                }
            }
        }
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    WebsitePage {
        title,
        text: lines.join("\n"),
    }
}

fn fetch_failed(url: &Url, err: impl std::fmt::Display) -> ApiError {
    tracing::warn!(%url, error = %err, "website fetch failed");
    ApiError::extraction(url.as_str(), "fetch-failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PAGE: &str = r#"
        <html>
          <head><title>Refund Policy</title><script>var x = 1;</script></head>
          <body>
            <nav>Home | About</nav>
            <h1>Refunds</h1>
            <p>Requests are honored within 30 days.</p>
            <script>trackPageView();</script>
            <style>.hidden { display: none }</style>
            <footer>Copyright</footer>
          </body>
        </html>
    "#;

    #[test]
    fn body_text_excludes_chrome_and_scripts() {
        let page = parse_page(PAGE);
        assert_eq!(page.title.as_deref(), Some("Refund Policy"));
        assert!(page.text.contains("Refunds"));
        assert!(page.text.contains("Requests are honored within 30 days."));
        assert!(!page.text.contains("trackPageView"));
        assert!(!page.text.contains("display: none"));
        assert!(!page.text.contains("Home | About"));
        assert!(!page.text.contains("Copyright"));
    }

    #[test]
    fn missing_title_yields_none() {
        let page = parse_page("<html><body><p>hello</p></body></html>");
        assert!(page.title.is_none());
        assert_eq!(page.text, "hello");
    }

    #[tokio::test]
    async fn http_error_status_is_fetch_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let url = Url::parse(&server.url("/missing")).unwrap();
        let client = reqwest::Client::new();
        let err = fetch(&client, &url).await.unwrap_err();
        match err {
            ApiError::Extraction { reason, .. } => assert_eq!(reason, "fetch-failed"),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_no_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blank");
                then.status(200)
                    .body("<html><body><script>only()</script></body></html>");
            })
            .await;

        let url = Url::parse(&server.url("/blank")).unwrap();
        let client = reqwest::Client::new();
        let err = fetch(&client, &url).await.unwrap_err();
        match err {
            ApiError::Extraction { reason, .. } => assert_eq!(reason, "no-content"),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_fetch_returns_title_and_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/page");
                then.status(200).body(PAGE);
            })
            .await;

        let url = Url::parse(&server.url("/page")).unwrap();
        let client = reqwest::Client::new();
        let page = fetch(&client, &url).await.unwrap();
        assert_eq!(page.title.as_deref(), Some("Refund Policy"));
        assert!(page.text.contains("30 days"));
    }
}
