//! Market-trend signal: headlines from a news API, with a fixed fallback list
//! so the recommendation pipeline never fails on trend-source availability.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";
const BASE_QUERY: &str = "job market trends";
/// Keywords folded into the news query, OR-combined.
const MAX_QUERY_KEYWORDS: usize = 4;
pub const TREND_LIMIT: usize = 5;

/// A news-derived market-trend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendItem {
    pub headline: String,
    pub source: String,
    pub summary: String,
    pub url: String,
    pub published_at: String,
}

/// Fetches trend items for a keyword set. Never fails: implementations fall
/// back to [`fallback_trends`] on any error.
#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch_trends(&self, keywords: &[String]) -> Vec<TrendItem>;
}

/// The fixed list served whenever the news source is unconfigured, down, or
/// returns nothing.
pub fn fallback_trends() -> Vec<TrendItem> {
    let now = Utc::now().to_rfc3339();
    let items = [
        (
            "AI and Machine Learning Jobs Surge in 2025",
            "TechCrunch",
            "The demand for AI and ML engineers continues to grow exponentially as companies invest heavily in automation and intelligent systems.",
        ),
        (
            "Remote Work Remains Top Priority for Job Seekers",
            "Forbes",
            "Latest surveys show that 78% of job seekers prioritize remote or hybrid work options when considering new opportunities.",
        ),
        (
            "Cybersecurity Skills in High Demand",
            "CNN Business",
            "With increasing cyber threats, companies are actively seeking cybersecurity professionals with cloud security expertise.",
        ),
        (
            "Web3 and Blockchain Development Opportunities Growing",
            "Bloomberg",
            "The Web3 ecosystem expansion creates numerous opportunities for developers skilled in blockchain technologies.",
        ),
        (
            "Full-Stack Developers Most Sought After",
            "LinkedIn",
            "Companies prefer versatile developers who can handle both frontend and backend development efficiently.",
        ),
    ];

    items
        .into_iter()
        .map(|(headline, source, summary)| TrendItem {
            headline: headline.to_string(),
            source: source.to_string(),
            summary: summary.to_string(),
            url: "#".to_string(),
            published_at: now.clone(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    title: Option<String>,
    source: Option<NewsSource>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsSource {
    name: Option<String>,
}

/// News-API-backed trend source. One HTTP call per recommendation request.
pub struct NewsApiClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl NewsApiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_NEWS_ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: Option<String>, endpoint: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint,
        }
    }

    fn build_query(keywords: &[String]) -> String {
        if keywords.is_empty() {
            return BASE_QUERY.to_string();
        }
        let picked: Vec<&str> = keywords
            .iter()
            .take(MAX_QUERY_KEYWORDS)
            .map(String::as_str)
            .collect();
        format!("{BASE_QUERY} ({})", picked.join(" OR "))
    }

    async fn fetch(&self, keywords: &[String], api_key: &str) -> anyhow::Result<Vec<TrendItem>> {
        let query = Self::build_query(keywords);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query.as_str()),
                ("sortBy", "publishedAt"),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("News API returned {status}");
        }

        let data: NewsResponse = response.json().await?;
        debug!(articles = data.articles.len(), "News API responded");

        Ok(data
            .articles
            .into_iter()
            .take(TREND_LIMIT)
            .map(|a| TrendItem {
                headline: a.title.unwrap_or_default(),
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                summary: a
                    .description
                    .or(a.content)
                    .unwrap_or_else(|| "Trending hiring insight".to_string()),
                url: a.url.unwrap_or_else(|| "#".to_string()),
                published_at: a.published_at.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl TrendSource for NewsApiClient {
    async fn fetch_trends(&self, keywords: &[String]) -> Vec<TrendItem> {
        let api_key = match &self.api_key {
            Some(k) => k,
            None => {
                debug!("News API key not configured, serving fallback trends");
                return fallback_trends();
            }
        };

        match self.fetch(keywords, api_key).await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                debug!("News API returned no articles, serving fallback trends");
                fallback_trends()
            }
            Err(e) => {
                warn!("Trend fetch failed, serving fallback trends: {e}");
                fallback_trends()
            }
        }
    }
}
