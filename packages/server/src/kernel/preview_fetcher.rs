//! Link preview fetcher - local HTTP + HTML parsing
//!
//! Fetches a submitted link and pulls a preview out of its `<head>`:
//! - `og:title`, falling back to `<title>`
//! - `og:image`
//! - every other `og:*`, `twitter:*` and `description` meta value, as metadata
//!
//! Limitations:
//! - No JavaScript rendering (pages that build their head client-side yield nothing)

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::{BasePreviewFetcher, LinkPreview};

/// Stop reading bodies after this many bytes; the head is near the top.
const MAX_BODY_BYTES: usize = 512 * 1024;

pub struct HttpPreviewFetcher {
    client: reqwest::Client,
}

impl HttpPreviewFetcher {
    pub fn new() -> Result<Self> {
        let user_agent = "Mozilla/5.0 (compatible; CommonsPreviewBot/0.1)";

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.5"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(truncate_at_char_boundary(body, MAX_BODY_BYTES))
    }
}

#[async_trait]
impl BasePreviewFetcher for HttpPreviewFetcher {
    async fn fetch(&self, url: &str) -> Result<LinkPreview> {
        let base = Url::parse(url).with_context(|| format!("invalid url {}", url))?;
        let html = self.fetch_html(url).await?;
        let preview = parse_preview(&html, &base)?;

        debug!(url, title = ?preview.title, "preview fetched");
        Ok(preview)
    }
}

fn truncate_at_char_boundary(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {}: {:?}", css, e))
}

/// Extract a preview from an HTML document. Relative image urls resolve
/// against `base`.
pub fn parse_preview(html: &str, base: &Url) -> Result<LinkPreview> {
    let document = Html::parse_document(html);
    let meta = selector("meta[property], meta[name]")?;
    let title = selector("title")?;

    let mut properties = BTreeMap::new();
    for element in document.select(&meta) {
        let value = element.value();
        let key = value.attr("property").or_else(|| value.attr("name"));
        let content = value.attr("content").map(str::trim).filter(|c| !c.is_empty());

        if let (Some(key), Some(content)) = (key, content) {
            let key = key.to_ascii_lowercase();
            if key.starts_with("og:") || key.starts_with("twitter:") || key == "description" {
                properties.entry(key).or_insert_with(|| content.to_string());
            }
        }
    }

    let document_title = document
        .select(&title)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let title = properties.remove("og:title").or(document_title);
    let image_url = properties
        .remove("og:image")
        .and_then(|image| base.join(&image).ok())
        .map(|image| image.to_string());

    Ok(LinkPreview {
        title,
        image_url,
        metadata: properties,
    })
}
