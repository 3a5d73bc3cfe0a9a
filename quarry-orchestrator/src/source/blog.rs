//! Blog source
//!
//! Reads server-rendered blog listing pages and article pages with reqwest and
//! CSS selectors. No JavaScript rendering: "load more" pagination is out of reach.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexSet;
use quarry_core::domain::job::Record;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use super::category::sections_for;
use super::{ArticleLink, ArticleSource, SourceError};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const CARD_LINK: &str = "div.BlogArticle_box__JyD1X a[href]";
const TITLE: &str = "h1.ArticleSingle_title__0DNjm";
const CATEGORY: &str = "a.text-primary-main";
const AUTHOR: &str = "div.flex.gap-2";
const READING_TIME: &str = "div.Text_body__snVk8";

/// Article source backed by the public blog
pub struct BlogSource {
    client: reqwest::Client,
    base_url: Url,
}

impl BlogSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn section_url(&self, slug: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(&format!("blog/{slug}"))
            .map_err(|e| SourceError::Parse {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ArticleSource for BlogSource {
    async fn discover(&self, category: &str) -> Result<Vec<ArticleLink>, SourceError> {
        let sections =
            sections_for(category).ok_or_else(|| SourceError::UnknownCategory(category.to_string()))?;

        let mut links = IndexSet::new();
        for slug in sections {
            let url = self.section_url(slug)?;
            let html = match self.fetch_html(url.as_str()).await {
                Ok(html) => html,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(section = slug, error = %e, "Skipping blog section");
                    continue;
                }
            };
            let found = parse_listing(&html, &url);
            tracing::debug!(section = slug, articles = found.len(), "Blog section listed");
            links.extend(found);
        }

        Ok(links.into_iter().map(ArticleLink::new).collect())
    }

    async fn extract(&self, link: &ArticleLink) -> Result<Option<Record>, SourceError> {
        let html = self.fetch_html(&link.url).await?;
        Ok(parse_article(&html, &link.url))
    }
}

/// Absolute article URLs found on a listing page, in page order
pub fn parse_listing(html: &str, page_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(CARD_LINK) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut seen = IndexSet::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Ok(absolute) = page_url.join(href.trim()) {
            seen.insert(absolute.to_string());
        }
    }
    seen.into_iter().collect()
}

/// Record for an article page, or `None` when the page has no article title
pub fn parse_article(html: &str, url: &str) -> Option<Record> {
    let document = Html::parse_document(html);

    let title = first_text(&document, TITLE)?;

    let mut record = Record::new();
    record.insert("title".into(), Value::String(title));
    record.insert(
        "category".into(),
        Value::String(first_text(&document, CATEGORY).unwrap_or_default()),
    );

    let byline = first_text(&document, AUTHOR).unwrap_or_default();
    let mut parts = byline.splitn(2, '|').map(str::trim);
    let author = parts.next().unwrap_or_default().to_string();
    let role = parts.next().unwrap_or_default().to_string();
    record.insert("author".into(), Value::String(author));
    record.insert("role".into(), Value::String(role));

    record.insert(
        "reading_time".into(),
        Value::String(first_text(&document, READING_TIME).unwrap_or_default()),
    );
    record.insert("url".into(), Value::String(url.to_string()));

    Some(record)
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="BlogArticle_box__JyD1X"><a href="/blog/pymes/uno">Uno</a></div>
          <div class="BlogArticle_box__JyD1X"><a href="https://xepelin.com/blog/pymes/dos">Dos</a></div>
          <div class="BlogArticle_box__JyD1X"><a href="/blog/pymes/uno">Uno otra vez</a></div>
          <div class="Other"><a href="/blog/ignored">No</a></div>
        </body></html>
    "#;

    const ARTICLE: &str = r#"
        <html><body>
          <a class="text-primary-main" href="/blog/pymes">Pymes</a>
          <h1 class="ArticleSingle_title__0DNjm">  Cómo financiar
             tu empresa </h1>
          <div class="flex gap-2">Ana Pérez | Editora</div>
          <div class="Text_body__snVk8">5 min de lectura</div>
        </body></html>
    "#;

    #[test]
    fn test_parse_listing_resolves_and_dedupes() {
        let page = Url::parse("https://xepelin.com/blog/pymes").unwrap();
        let links = parse_listing(LISTING, &page);
        assert_eq!(
            links,
            vec![
                "https://xepelin.com/blog/pymes/uno".to_string(),
                "https://xepelin.com/blog/pymes/dos".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_article_fields() {
        let record = parse_article(ARTICLE, "https://xepelin.com/blog/pymes/uno").unwrap();
        assert_eq!(record["title"], "Cómo financiar tu empresa");
        assert_eq!(record["category"], "Pymes");
        assert_eq!(record["author"], "Ana Pérez");
        assert_eq!(record["role"], "Editora");
        assert_eq!(record["reading_time"], "5 min de lectura");
        assert_eq!(record["url"], "https://xepelin.com/blog/pymes/uno");
    }

    #[test]
    fn test_parse_article_without_title() {
        assert!(parse_article("<html><body><p>404</p></body></html>", "u").is_none());
    }

    #[test]
    fn test_byline_without_role() {
        let html = r#"<h1 class="ArticleSingle_title__0DNjm">T</h1><div class="flex gap-2">Solo Autor</div>"#;
        let record = parse_article(html, "u").unwrap();
        assert_eq!(record["author"], "Solo Autor");
        assert_eq!(record["role"], "");
    }

    #[tokio::test]
    async fn test_discover_rejects_unknown_category() {
        let source = BlogSource::new("https://xepelin.com", Duration::from_secs(1)).unwrap();
        let err = source.discover("recetas").await.unwrap_err();
        assert!(matches!(err, SourceError::UnknownCategory(_)));
        assert!(err.is_fatal());
    }
}
