mod feed;
mod fetch;
pub mod model;

use crate::config::RuntimeConfig;
use crate::open_url::open_url;
use crate::ui::{self, FeedKey, InfiniteList};
use anyhow::Result;
use console::Term;
use tracing::warn;

pub use feed::{capitalize, FeedController, FeedView, ProgressReporter, TitleSink};
pub use fetch::{NewsApiClient, DEFAULT_BASE_URL};
pub use model::ArticleView;

pub enum FeedExit {
    Back,
    Quit,
}

/// Owns the client and the single feed controller for the whole session.
/// Picking a category re-mounts the controller instead of building a new one.
pub struct Reader {
    client: NewsApiClient,
    term: Term,
    title: ui::TerminalTitle,
    feed: Option<FeedController>,
}

fn mount_or_remount<'a>(
    slot: &'a mut Option<FeedController>,
    config: crate::config::FeedConfig,
    title: &mut dyn TitleSink,
) -> &'a mut FeedController {
    let feed = match slot.take() {
        Some(mut feed) => {
            feed.remount(config, title);
            feed
        }
        None => FeedController::mount(config, title),
    };
    slot.insert(feed)
}

impl Reader {
    pub fn new(cfg: &RuntimeConfig) -> Result<Self> {
        let term = Term::stdout();
        Ok(Self {
            client: NewsApiClient::new(&cfg.base_url, &cfg.api_key)?,
            title: ui::TerminalTitle::new(term.clone()),
            term,
            feed: None,
        })
    }

    /// Mount `category` and drive its feed until the user leaves it.
    pub async fn run(&mut self, cfg: &RuntimeConfig, category: &str) -> Result<FeedExit> {
        let term = &self.term;
        let client = &self.client;
        let header = cfg.header.as_deref();
        let feed = mount_or_remount(&mut self.feed, cfg.feed_config(category), &mut self.title);
        let mut list = InfiniteList::default();

        ui::draw_feed(term, header, &feed.config().category, &feed.view(), &mut list)?;
        let mut progress = ui::ProgressBar::new(term.clone());
        feed.initial_load(client, &mut progress).await;

        loop {
            ui::draw_feed(term, header, &feed.config().category, &feed.view(), &mut list)?;

            if matches!(feed.view(), FeedView::Unavailable) {
                match ui::read_feed_key(term)? {
                    FeedKey::Quit => return Ok(FeedExit::Quit),
                    FeedKey::Back => return Ok(FeedExit::Back),
                    _ => continue,
                }
            }

            let len = feed.state().articles.len();
            if list.wants_more(len, feed.has_more() && !feed.is_pending()) {
                ui::draw_loader(term)?;
                feed.load_more(client).await;
                continue;
            }

            match ui::read_feed_key(term)? {
                FeedKey::Quit => return Ok(FeedExit::Quit),
                FeedKey::Back => return Ok(FeedExit::Back),
                FeedKey::Open => {
                    if let Some(article) = feed.state().articles.get(list.cursor.selected) {
                        if let Err(err) = open_url(&article.url) {
                            warn!(url = %article.url, "could not open article: {err:#}");
                        }
                    }
                }
                FeedKey::Move(key) => list.cursor.navigate(&key, len, ui::feed_page_rows(term)),
            }
        }
    }
}
