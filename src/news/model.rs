use serde::{Deserialize, Serialize};

/// Publisher attribution attached to every article.
///
/// `name` is required: a response that omits it does not deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// One headline as returned by `/v2/top-headlines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Source,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Successful response body for one page of headlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesPage {
    #[serde(default)]
    pub status: Option<String>,
    pub total_results: u32,
    pub articles: Vec<Article>,
}

/// Error body NewsAPI sends alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Display record handed to the item renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleView<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub image_url: Option<&'a str>,
    pub url: &'a str,
    pub author: Option<&'a str>,
    pub published_at: &'a str,
    pub source: &'a str,
}

impl<'a> From<&'a Article> for ArticleView<'a> {
    fn from(a: &'a Article) -> Self {
        ArticleView {
            title: a.title.as_deref().unwrap_or(""),
            description: a.description.as_deref().unwrap_or(""),
            image_url: a.url_to_image.as_deref(),
            url: &a.url,
            author: a.author.as_deref(),
            published_at: &a.published_at,
            source: &a.source.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "status": "ok",
        "totalResults": 38,
        "articles": [
            {
                "source": {"id": "espn", "name": "ESPN"},
                "author": "Jane Doe",
                "title": "Late goal seals the title",
                "description": "A stoppage-time winner.",
                "url": "https://example.com/a",
                "urlToImage": "https://example.com/a.jpg",
                "publishedAt": "2024-05-01T10:15:00Z",
                "content": "Full text..."
            },
            {
                "source": {"id": null, "name": "Reuters"},
                "author": null,
                "title": "Markets steady",
                "description": null,
                "url": "https://example.com/b",
                "urlToImage": null,
                "publishedAt": "2024-05-01T09:00:00Z",
                "content": null
            }
        ]
    }"#;

    #[test]
    fn parses_headlines_page() {
        let page: HeadlinesPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.total_results, 38);
        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.articles[0].source.name, "ESPN");
        assert_eq!(page.articles[0].url_to_image.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(page.articles[1].author, None);
    }

    #[test]
    fn view_defaults_missing_text_fields() {
        let page: HeadlinesPage = serde_json::from_str(PAGE).unwrap();
        let view = ArticleView::from(&page.articles[1]);
        assert_eq!(view.description, "");
        assert_eq!(view.image_url, None);
        assert_eq!(view.author, None);
        assert_eq!(view.title, "Markets steady");
        assert_eq!(view.source, "Reuters");
        assert_eq!(view.url, "https://example.com/b");
    }

    #[test]
    fn view_defaults_title_when_absent() {
        let body = r#"{"source":{"name":"AP"},"url":"https://example.com/c","publishedAt":"2024-05-01T09:00:00Z"}"#;
        let article: Article = serde_json::from_str(body).unwrap();
        let view = ArticleView::from(&article);
        assert_eq!(view.title, "");
        assert_eq!(view.description, "");
        assert_eq!(view.published_at, "2024-05-01T09:00:00Z");
    }

    #[test]
    fn missing_source_name_is_rejected() {
        let body = r#"{"source":{"id":"x"},"url":"https://example.com/c","publishedAt":"2024-05-01T09:00:00Z"}"#;
        assert!(serde_json::from_str::<Article>(body).is_err());
    }
}
