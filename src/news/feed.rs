//! Incremental-loading headline feed.
//!
//! A [`FeedController`] owns the state of one mounted category: the merged
//! article list, the page counter, the upstream total and the loading/error
//! flags. Loads are split into `begin_*` and [`FeedController::complete`] so
//! that only the request currently in flight can mutate state; anything
//! issued before a newer request or a re-mount comes back as
//! [`Completion::Stale`] and is dropped.

use super::fetch::{FetchError, FetchStage, HeadlinesQuery, HeadlinesSource};
use super::model::{Article, HeadlinesPage};
use crate::config::FeedConfig;
use tracing::{debug, error, info};

/// Receives progress checkpoints (0..=100) during an initial load.
pub trait ProgressReporter {
    fn set_progress(&mut self, percent: u8);
}

/// Reflects the mounted category in the window chrome.
pub trait TitleSink {
    fn set_title(&mut self, title: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub articles: Vec<Article>,
    pub page: u32,
    pub total_results: u32,
    pub loading: bool,
    pub error: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            page: 1,
            total_results: 0,
            loading: true,
            error: false,
        }
    }
}

impl FeedState {
    pub fn has_more(&self) -> bool {
        self.articles.len() != self.total_results as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    Incremental,
}

/// Handle for one issued page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    id: u64,
    pub page: u32,
    pub kind: LoadKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Stale,
}

/// What the feed screen should draw right now.
#[derive(Debug, PartialEq, Eq)]
pub enum FeedView<'a> {
    Unavailable,
    Loading { partial: &'a [Article] },
    Content(&'a [Article]),
}

#[derive(Debug)]
pub struct FeedController {
    config: FeedConfig,
    state: FeedState,
    next_ticket: u64,
    in_flight: Option<PageTicket>,
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn window_title(category: &str) -> String {
    format!("{} - NewsApp", capitalize(category))
}

impl FeedController {
    pub fn mount(config: FeedConfig, title: &mut dyn TitleSink) -> Self {
        let mut controller = Self {
            config,
            state: FeedState::default(),
            next_ticket: 0,
            in_flight: None,
        };
        controller.on_mount(title);
        controller
    }

    /// Switch to a new configuration, discarding state and any pending request.
    pub fn remount(&mut self, config: FeedConfig, title: &mut dyn TitleSink) {
        self.config = config;
        self.state = FeedState::default();
        self.in_flight = None;
        self.on_mount(title);
    }

    fn on_mount(&mut self, title: &mut dyn TitleSink) {
        info!(
            country = %self.config.country,
            category = %self.config.category,
            page_size = self.config.page_size,
            "feed mounted"
        );
        title.set_title(&window_title(&self.config.category));
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn view(&self) -> FeedView<'_> {
        if self.state.error {
            FeedView::Unavailable
        } else if self.state.loading {
            FeedView::Loading {
                partial: &self.state.articles,
            }
        } else {
            FeedView::Content(&self.state.articles)
        }
    }

    pub fn query(&self, page: u32) -> HeadlinesQuery {
        HeadlinesQuery {
            country: self.config.country.clone(),
            category: self.config.category.clone(),
            page,
            page_size: self.config.page_size,
        }
    }

    fn issue(&mut self, page: u32, kind: LoadKind) -> PageTicket {
        self.next_ticket += 1;
        let ticket = PageTicket {
            id: self.next_ticket,
            page,
            kind,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// Start loading page 1. Supersedes whatever is in flight.
    pub fn begin_initial(&mut self) -> PageTicket {
        self.state.page = 1;
        self.state.loading = true;
        self.issue(1, LoadKind::Initial)
    }

    /// Start loading the next page, or `None` if the feed cannot take one now.
    ///
    /// The page counter advances before the request is answered and is not
    /// rolled back on failure.
    pub fn begin_incremental(&mut self) -> Option<PageTicket> {
        if self.in_flight.is_some() || self.state.error || !self.state.has_more() {
            return None;
        }
        self.state.page += 1;
        Some(self.issue(self.state.page, LoadKind::Incremental))
    }

    pub fn complete(
        &mut self,
        ticket: PageTicket,
        result: Result<HeadlinesPage, FetchError>,
    ) -> Completion {
        if self.in_flight != Some(ticket) {
            debug!(page = ticket.page, "discarding stale page response");
            return Completion::Stale;
        }
        self.in_flight = None;

        match (ticket.kind, result) {
            (LoadKind::Initial, Ok(page)) => {
                self.state.articles = page.articles;
                self.state.total_results = page.total_results;
                self.state.loading = false;
                self.state.error = false;
                Completion::Applied
            }
            (LoadKind::Initial, Err(err)) => {
                error!(page = ticket.page, "API error: {err}");
                self.state.error = true;
                self.state.loading = false;
                Completion::Failed
            }
            (LoadKind::Incremental, Ok(page)) => {
                self.state.articles.extend(page.articles);
                self.state.total_results = page.total_results;
                Completion::Applied
            }
            (LoadKind::Incremental, Err(err)) => {
                error!(page = ticket.page, "API error on scroll: {err}");
                self.state.error = true;
                Completion::Failed
            }
        }
    }

    /// Fetch page 1 and replace the list, reporting 10/30/70/100 progress.
    pub async fn initial_load<S: HeadlinesSource>(
        &mut self,
        source: &S,
        progress: &mut dyn ProgressReporter,
    ) -> Completion {
        progress.set_progress(10);
        let ticket = self.begin_initial();
        let query = self.query(ticket.page);
        let result = {
            let mut on_stage = |stage: FetchStage| match stage {
                FetchStage::HeadersReceived => progress.set_progress(30),
                FetchStage::BodyParsed => progress.set_progress(70),
            };
            source.fetch_page(&query, &mut on_stage).await
        };
        let outcome = self.complete(ticket, result);
        progress.set_progress(100);
        outcome
    }

    /// Fetch the next page and append it. Returns `None` when refused.
    pub async fn load_more<S: HeadlinesSource>(&mut self, source: &S) -> Option<Completion> {
        let ticket = self.begin_incremental()?;
        let query = self.query(ticket.page);
        let result = source.fetch_page(&query, &mut |_: FetchStage| {}).await;
        Some(self.complete(ticket, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::model::Source;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    enum Reply {
        Page(u32, Vec<Article>),
        Status(u16),
        Garbled,
    }

    #[derive(Default)]
    struct Scripted {
        replies: RefCell<VecDeque<Reply>>,
        seen: RefCell<Vec<HeadlinesQuery>>,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                seen: RefCell::default(),
            }
        }

        fn pages_requested(&self) -> Vec<u32> {
            self.seen.borrow().iter().map(|q| q.page).collect()
        }
    }

    impl HeadlinesSource for Scripted {
        async fn fetch_page(
            &self,
            query: &HeadlinesQuery,
            on_stage: &mut dyn FnMut(FetchStage),
        ) -> Result<HeadlinesPage, FetchError> {
            self.seen.borrow_mut().push(query.clone());
            let reply = self
                .replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected fetch");
            match reply {
                Reply::Page(total, articles) => {
                    on_stage(FetchStage::HeadersReceived);
                    on_stage(FetchStage::BodyParsed);
                    Ok(HeadlinesPage {
                        status: Some("ok".into()),
                        total_results: total,
                        articles,
                    })
                }
                Reply::Status(status) => {
                    on_stage(FetchStage::HeadersReceived);
                    Err(FetchError::Status {
                        status,
                        code: None,
                        message: None,
                    })
                }
                Reply::Garbled => Err(FetchError::Parse(
                    serde_json::from_str::<HeadlinesPage>("").unwrap_err(),
                )),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u8>,
        titles: Vec<String>,
    }

    impl ProgressReporter for Recorder {
        fn set_progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }
    }

    impl TitleSink for Recorder {
        fn set_title(&mut self, title: &str) {
            self.titles.push(title.to_string());
        }
    }

    fn article(n: u32) -> Article {
        Article {
            source: Source {
                id: None,
                name: "Wire".into(),
            },
            author: None,
            title: Some(format!("Story {n}")),
            description: None,
            url: format!("https://example.com/{n}"),
            url_to_image: None,
            published_at: "2024-05-01T10:00:00Z".into(),
            content: None,
        }
    }

    fn articles(range: std::ops::RangeInclusive<u32>) -> Vec<Article> {
        range.map(article).collect()
    }

    fn config(country: &str, category: &str, page_size: u32) -> FeedConfig {
        FeedConfig {
            country: country.into(),
            category: category.into(),
            api_key: "test".into(),
            page_size,
        }
    }

    fn urls(c: &FeedController) -> Vec<&str> {
        c.state().articles.iter().map(|a| a.url.as_str()).collect()
    }

    #[tokio::test]
    async fn scrolls_through_three_pages_until_exhausted() {
        let source = Scripted::new(vec![
            Reply::Page(5, articles(1..=2)),
            Reply::Page(5, articles(3..=4)),
            Reply::Page(5, articles(5..=5)),
        ]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "sports", 2), &mut rec);

        assert_eq!(feed.initial_load(&source, &mut rec).await, Completion::Applied);
        assert_eq!(feed.state().articles.len(), 2);
        assert_eq!(feed.state().page, 1);
        assert!(feed.has_more());

        assert_eq!(feed.load_more(&source).await, Some(Completion::Applied));
        assert_eq!(feed.state().articles.len(), 4);
        assert_eq!(feed.state().page, 2);
        assert!(feed.has_more());

        assert_eq!(feed.load_more(&source).await, Some(Completion::Applied));
        assert_eq!(feed.state().articles.len(), 5);
        assert_eq!(feed.state().page, 3);
        assert!(!feed.has_more());

        assert_eq!(feed.load_more(&source).await, None);
        assert_eq!(source.pages_requested(), vec![1, 2, 3]);
        assert_eq!(
            urls(&feed),
            (1..=5).map(|n| format!("https://example.com/{n}")).collect::<Vec<_>>()
        );
        let seen = source.seen.borrow();
        let q = &seen[2];
        assert_eq!((q.country.as_str(), q.category.as_str(), q.page_size), ("us", "sports", 2));
    }

    #[tokio::test]
    async fn initial_load_reports_progress_and_page_size() {
        let source = Scripted::new(vec![Reply::Page(30, articles(1..=8))]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("in", "general", 8), &mut rec);
        feed.initial_load(&source, &mut rec).await;
        assert_eq!(rec.progress, vec![10, 30, 70, 100]);
        assert_eq!(feed.state().articles.len(), 8);
        assert!(matches!(feed.view(), FeedView::Content(items) if items.len() == 8));
    }

    #[tokio::test]
    async fn incremental_load_does_not_drive_progress() {
        let source = Scripted::new(vec![
            Reply::Page(4, articles(1..=2)),
            Reply::Page(4, articles(3..=4)),
        ]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("in", "general", 2), &mut rec);
        feed.initial_load(&source, &mut rec).await;
        feed.load_more(&source).await;
        assert_eq!(rec.progress, vec![10, 30, 70, 100]);
    }

    #[tokio::test]
    async fn http_426_on_initial_load_shows_unavailable() {
        let source = Scripted::new(vec![Reply::Status(426)]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "general", 8), &mut rec);
        assert_eq!(feed.initial_load(&source, &mut rec).await, Completion::Failed);
        assert!(feed.state().error);
        assert!(!feed.state().loading);
        assert!(feed.state().articles.is_empty());
        assert_eq!(feed.view(), FeedView::Unavailable);
        assert_eq!(rec.progress, vec![10, 30, 100]);
    }

    #[tokio::test]
    async fn unparseable_body_still_finishes_progress() {
        let source = Scripted::new(vec![Reply::Garbled]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "general", 8), &mut rec);
        feed.initial_load(&source, &mut rec).await;
        assert_eq!(rec.progress, vec![10, 100]);
        assert_eq!(feed.view(), FeedView::Unavailable);
    }

    #[tokio::test]
    async fn failed_scroll_keeps_list_and_advances_page() {
        let source = Scripted::new(vec![Reply::Page(6, articles(1..=2)), Reply::Status(500)]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "general", 2), &mut rec);
        feed.initial_load(&source, &mut rec).await;

        assert_eq!(feed.load_more(&source).await, Some(Completion::Failed));
        assert!(feed.state().error);
        assert_eq!(feed.state().page, 2);
        assert_eq!(feed.state().articles.len(), 2);
        assert_eq!(feed.view(), FeedView::Unavailable);
        // error halts further scrolling
        assert_eq!(feed.load_more(&source).await, None);
    }

    #[tokio::test]
    async fn only_successful_initial_load_clears_error() {
        let source = Scripted::new(vec![Reply::Status(401), Reply::Page(1, articles(1..=1))]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "general", 8), &mut rec);
        feed.initial_load(&source, &mut rec).await;
        assert!(feed.state().error);

        feed.remount(config("us", "general", 8), &mut rec);
        feed.initial_load(&source, &mut rec).await;
        assert!(!feed.state().error);
        assert!(matches!(feed.view(), FeedView::Content(items) if items.len() == 1));
    }

    #[tokio::test]
    async fn repeated_initial_load_replaces_list() {
        let source = Scripted::new(vec![
            Reply::Page(10, articles(1..=3)),
            Reply::Page(10, articles(4..=5)),
            Reply::Page(10, articles(1..=3)),
        ]);
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "health", 3), &mut rec);
        feed.initial_load(&source, &mut rec).await;
        let first = feed.state().articles.clone();
        feed.load_more(&source).await;
        assert_eq!(feed.state().articles.len(), 5);

        feed.initial_load(&source, &mut rec).await;
        assert_eq!(feed.state().articles, first);
        assert_eq!(feed.state().page, 1);
        assert_eq!(source.pages_requested(), vec![1, 2, 1]);
    }

    #[test]
    fn second_incremental_refused_while_pending() {
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "general", 2), &mut rec);
        let t = feed.begin_initial();
        feed.complete(
            t,
            Ok(HeadlinesPage {
                status: None,
                total_results: 6,
                articles: articles(1..=2),
            }),
        );
        let first = feed.begin_incremental().unwrap();
        assert!(feed.is_pending());
        assert_eq!(feed.begin_incremental(), None);
        assert_eq!(first.page, 2);
    }

    #[test]
    fn stale_response_after_remount_is_discarded() {
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "sports", 2), &mut rec);
        let old = feed.begin_initial();

        feed.remount(config("us", "science", 2), &mut rec);
        let fresh = feed.begin_initial();

        let late = HeadlinesPage {
            status: None,
            total_results: 9,
            articles: articles(1..=2),
        };
        assert_eq!(feed.complete(old, Ok(late)), Completion::Stale);
        assert!(feed.state().articles.is_empty());
        assert!(matches!(feed.view(), FeedView::Loading { partial } if partial.is_empty()));

        let current = HeadlinesPage {
            status: None,
            total_results: 4,
            articles: articles(7..=8),
        };
        assert_eq!(feed.complete(fresh, Ok(current)), Completion::Applied);
        assert_eq!(urls(&feed), vec!["https://example.com/7", "https://example.com/8"]);
        assert_eq!(rec.titles, vec!["Sports - NewsApp", "Science - NewsApp"]);
    }

    #[test]
    fn superseded_incremental_does_not_append() {
        let mut rec = Recorder::default();
        let mut feed = FeedController::mount(config("us", "sports", 2), &mut rec);
        let t = feed.begin_initial();
        feed.complete(
            t,
            Ok(HeadlinesPage {
                status: None,
                total_results: 6,
                articles: articles(1..=2),
            }),
        );
        let scroll = feed.begin_incremental().unwrap();
        let reload = feed.begin_initial();
        let page2 = HeadlinesPage {
            status: None,
            total_results: 6,
            articles: articles(3..=4),
        };
        assert_eq!(feed.complete(scroll, Ok(page2)), Completion::Stale);
        assert_eq!(feed.state().articles.len(), 2);
        assert!(feed.is_pending());
        assert_eq!(reload.page, 1);
    }

    #[test]
    fn fresh_feed_is_loading_and_has_no_more() {
        let mut rec = Recorder::default();
        let feed = FeedController::mount(FeedConfig::default(), &mut rec);
        assert_eq!(feed.state().page, 1);
        assert!(!feed.has_more());
        assert!(matches!(feed.view(), FeedView::Loading { .. }));
        assert_eq!(rec.titles, vec!["General - NewsApp"]);
    }

    #[test]
    fn capitalizes_category() {
        assert_eq!(capitalize("technology"), "Technology");
        assert_eq!(capitalize(""), "");
        assert_eq!(window_title("business"), "Business - NewsApp");
    }
}
