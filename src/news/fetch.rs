use super::model::{ApiErrorBody, HeadlinesPage};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";

// 5 MB cap
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("NewsAPI returned HTTP {status}{}", describe(.code, .message))]
    Status {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("response body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn describe(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(c), Some(m)) => format!(" ({c}: {m})"),
        (Some(c), None) => format!(" ({c})"),
        (None, Some(m)) => format!(" ({m})"),
        (None, None) => String::new(),
    }
}

/// Checkpoints reached while a page request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    HeadersReceived,
    BodyParsed,
}

/// Parameters of a single top-headlines request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlinesQuery {
    pub country: String,
    pub category: String,
    pub page: u32,
    pub page_size: u32,
}

/// Anything that can serve pages of top headlines.
pub trait HeadlinesSource {
    async fn fetch_page(
        &self,
        query: &HeadlinesQuery,
        on_stage: &mut dyn FnMut(FetchStage),
    ) -> Result<HeadlinesPage, FetchError>;
}

pub struct NewsApiClient {
    client: Client,
    base: Url,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("headlines-cli/0.1")
            .gzip(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()?;
        let mut base = Url::parse(base_url)?;
        // keep any path prefix when joining the endpoint below
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            api_key: api_key.to_string(),
        })
    }

    pub fn headlines_url(&self, query: &HeadlinesQuery) -> Result<Url, FetchError> {
        let mut url = self.base.join("v2/top-headlines")?;
        url.query_pairs_mut()
            .append_pair("country", &query.country)
            .append_pair("category", &query.category)
            .append_pair("apiKey", &self.api_key)
            .append_pair("page", &query.page.to_string())
            .append_pair("pageSize", &query.page_size.to_string());
        Ok(url)
    }
}

impl HeadlinesSource for NewsApiClient {
    async fn fetch_page(
        &self,
        query: &HeadlinesQuery,
        on_stage: &mut dyn FnMut(FetchStage),
    ) -> Result<HeadlinesPage, FetchError> {
        let url = self.headlines_url(query)?;
        debug!(
            country = %query.country,
            category = %query.category,
            page = query.page,
            page_size = query.page_size,
            "requesting top headlines"
        );
        // reqwest embeds the request URL in its errors; ours carries the API key
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url()))?;
        on_stage(FetchStage::HeadersReceived);

        let status = resp.status().as_u16();
        let body = read_capped(resp, MAX_BODY_BYTES).await?;
        let page = interpret_response(status, &body)?;
        on_stage(FetchStage::BodyParsed);
        debug!(
            page = query.page,
            received = page.articles.len(),
            total = page.total_results,
            "headlines page parsed"
        );
        Ok(page)
    }
}

async fn read_capped(resp: Response, max: usize) -> Result<Vec<u8>, FetchError> {
    let mut stream = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Transport(e.without_url()))?;
        if buf.len() + chunk.len() > max {
            return Err(FetchError::TooLarge(max));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Turn a status code and raw body into a page or a failure.
pub fn interpret_response(status: u16, body: &[u8]) -> Result<HeadlinesPage, FetchError> {
    if !(200..300).contains(&status) {
        let err = serde_json::from_slice::<ApiErrorBody>(body).ok();
        return Err(FetchError::Status {
            status,
            code: err.as_ref().and_then(|e| e.code.clone()),
            message: err.and_then(|e| e.message),
        });
    }
    let page: HeadlinesPage = serde_json::from_slice(body)?;
    if page.status.as_deref() == Some("error") {
        return Err(FetchError::Status {
            status,
            code: None,
            message: Some("status \"error\" in a 2xx response".into()),
        });
    }
    Ok(page)
}
