use crate::news::{capitalize, ArticleView, FeedView, ProgressReporter, TitleSink};
use crate::util::sanitize::sanitize_for_terminal;
use anyhow::Result;
use console::{style, Key, Term};
use dialoguer::Input;
use std::ops::Range;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

pub enum MenuChoice {
    Back,
    Quit,
    Index(usize),
}

/// Numbered menu. The first key picks the mode: arrows switch to cursor
/// selection, anything printable opens a text prompt seeded with that key.
pub fn prompt_menu(
    prompt: &str,
    items: &[String],
    default: Option<usize>,
    header: Option<&str>,
) -> Result<MenuChoice> {
    let term = Term::stdout();
    loop {
        term.clear_screen()?;
        if let Some(h) = header {
            println!("{}", h);
        }
        println!("{}", prompt);
        for (i, it) in items.iter().enumerate() {
            println!("{}: {}", i + 1, it);
        }
        println!("Type a number + Enter, or use arrow keys + Enter. 'b' = back, 'q' = quit.");

        let typed = match term.read_key()? {
            Key::ArrowUp | Key::ArrowDown | Key::Home | Key::End | Key::PageUp | Key::PageDown => {
                return arrow_select(&term, prompt, items, default, header);
            }
            Key::Char('q') | Key::Char('Q') => return Ok(MenuChoice::Quit),
            Key::Char('b') | Key::Char('B') | Key::Escape => return Ok(MenuChoice::Back),
            Key::Enter => String::new(),
            Key::Char(c) if !c.is_control() => {
                Input::<String>::new()
                    .with_prompt("Selection")
                    .allow_empty(true)
                    .with_initial_text(c.to_string())
                    .interact_text()?
            }
            _ => Input::<String>::new()
                .with_prompt("Selection")
                .allow_empty(true)
                .interact_text()?,
        };
        if let Some(choice) = parse_selection(&typed, items.len(), default) {
            return Ok(choice);
        }
    }
}

fn parse_selection(input: &str, len: usize, default: Option<usize>) -> Option<MenuChoice> {
    let s = input.trim();
    if s.is_empty() {
        return default.map(MenuChoice::Index);
    }
    if s.eq_ignore_ascii_case("q") {
        return Some(MenuChoice::Quit);
    }
    if s.eq_ignore_ascii_case("b") {
        return Some(MenuChoice::Back);
    }
    match s.parse::<usize>() {
        Ok(idx) if idx >= 1 && idx <= len => Some(MenuChoice::Index(idx - 1)),
        _ => None,
    }
}

fn arrow_select(
    term: &Term,
    prompt: &str,
    items: &[String],
    default: Option<usize>,
    header: Option<&str>,
) -> Result<MenuChoice> {
    let mut cursor = Cursor::at(default.unwrap_or(0), items.len());
    loop {
        term.clear_screen()?;
        if let Some(h) = header {
            println!("{}", h);
        }
        println!("{}", prompt);
        let rows = visible_rows(term, 2 + header.is_some() as usize);
        for i in cursor.window(items.len(), rows) {
            let marker = if i == cursor.selected { ">" } else { " " };
            println!("{} {}: {}", marker, i + 1, items[i]);
        }
        println!("Use arrows + Enter. 'b' = back, 'q' = quit.");

        match term.read_key()? {
            Key::Enter if !items.is_empty() => return Ok(MenuChoice::Index(cursor.selected)),
            Key::Char('q') | Key::Char('Q') => return Ok(MenuChoice::Quit),
            Key::Char('b') | Key::Char('B') | Key::Escape => return Ok(MenuChoice::Back),
            key => cursor.navigate(&key, items.len(), rows),
        }
    }
}

fn visible_rows(term: &Term, reserved: usize) -> usize {
    let (rows, _cols) = term.size();
    (rows as usize).saturating_sub(reserved).max(3)
}

/// Selection plus the first row of the visible window.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub selected: usize,
    top: usize,
}

impl Cursor {
    fn at(selected: usize, len: usize) -> Self {
        Self {
            selected: selected.min(len.saturating_sub(1)),
            top: 0,
        }
    }

    pub fn navigate(&mut self, key: &Key, len: usize, page: usize) {
        let last = len.saturating_sub(1);
        let step = page.saturating_sub(1).max(1);
        match key {
            Key::ArrowUp | Key::Char('k') => self.selected = self.selected.saturating_sub(1),
            Key::ArrowDown | Key::Char('j') => self.selected = (self.selected + 1).min(last),
            Key::PageUp => self.selected = self.selected.saturating_sub(step),
            Key::PageDown => self.selected = (self.selected + step).min(last),
            Key::Home => self.selected = 0,
            Key::End => self.selected = last,
            _ => {}
        }
    }

    /// Rows to draw, scrolled so the selection stays visible.
    pub fn window(&mut self, len: usize, rows: usize) -> Range<usize> {
        let rows = rows.min(len);
        if rows == 0 {
            return 0..0;
        }
        if self.selected < self.top {
            self.top = self.selected;
        }
        if self.selected >= self.top + rows {
            self.top = self.selected + 1 - rows;
        }
        self.top..(self.top + rows).min(len)
    }
}

/// Scroll host for the feed: asks for the next page when the cursor gets
/// within `threshold` rows of the end. Fires once per list length, so an
/// empty page cannot make it spin.
#[derive(Debug, Clone)]
pub struct InfiniteList {
    pub cursor: Cursor,
    threshold: usize,
    fired_at: Option<usize>,
}

impl Default for InfiniteList {
    fn default() -> Self {
        Self::with_threshold(2)
    }
}

impl InfiniteList {
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            cursor: Cursor::default(),
            threshold,
            fired_at: None,
        }
    }

    pub fn wants_more(&mut self, len: usize, has_more: bool) -> bool {
        if !has_more || self.fired_at == Some(len) {
            return false;
        }
        if self.cursor.selected + self.threshold >= len {
            self.fired_at = Some(len);
            return true;
        }
        false
    }
}

pub struct ProgressBar {
    term: Term,
    width: usize,
}

impl ProgressBar {
    pub fn new(term: Term) -> Self {
        Self { term, width: 30 }
    }
}

pub fn progress_line(percent: u8, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = width * percent / 100;
    format!("[{}{}] {:>3}%", "#".repeat(filled), " ".repeat(width - filled), percent)
}

impl ProgressReporter for ProgressBar {
    fn set_progress(&mut self, percent: u8) {
        let line = progress_line(percent, self.width);
        // a failed redraw only loses a frame of the bar
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&style(line).cyan().to_string());
        if percent >= 100 {
            let _ = self.term.clear_line();
        }
    }
}

pub struct TerminalTitle {
    term: Term,
}

impl TerminalTitle {
    pub fn new(term: Term) -> Self {
        Self { term }
    }
}

impl TitleSink for TerminalTitle {
    fn set_title(&mut self, title: &str) {
        self.term.set_title(title);
    }
}

pub fn draw_loader(term: &Term) -> Result<()> {
    term.write_line(&style("Loading...").yellow().to_string())?;
    Ok(())
}

pub fn heading(category: &str) -> String {
    format!("NewsApp - Top {} Headlines", capitalize(category))
}

pub fn unavailable_message() -> Vec<String> {
    vec![
        style("News Feed Not Available").red().bold().to_string(),
        String::new(),
        "This app uses NewsAPI, which rejects requests from production deployments".into(),
        "on the free tier, along with invalid keys and exhausted quotas.".into(),
        "Check your API key and run it from a developer machine.".into(),
        String::new(),
        "b = back to categories, q = quit".into(),
    ]
}

pub fn format_date(raw: &str) -> String {
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|dt| dt.format(&Rfc2822).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Detail block for one article.
pub fn render_article(view: &ArticleView<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        style(format!("[{}]", sanitize_for_terminal(view.source))).magenta(),
        style(sanitize_for_terminal(view.title)).bold()
    ));
    if !view.description.is_empty() {
        lines.push(sanitize_for_terminal(view.description));
    }
    lines.push(
        style(format!(
            "By {} on {}",
            sanitize_for_terminal(view.author.unwrap_or("Unknown")),
            format_date(view.published_at)
        ))
        .dim()
        .to_string(),
    );
    lines.push(match view.image_url {
        Some(img) => format!("Image: {}", sanitize_for_terminal(img)),
        None => style("(no image)").dim().to_string(),
    });
    lines.push(format!("Read more: {}", sanitize_for_terminal(view.url)));
    lines
}

pub fn draw_feed(
    term: &Term,
    header: Option<&str>,
    category: &str,
    view: &FeedView<'_>,
    list: &mut InfiniteList,
) -> Result<()> {
    term.clear_screen()?;
    if let Some(h) = header {
        term.write_line(h)?;
    }
    term.write_line(&style(heading(category)).bold().to_string())?;
    term.write_line("")?;

    let (articles, loading) = match view {
        FeedView::Unavailable => {
            for line in unavailable_message() {
                term.write_line(&line)?;
            }
            return Ok(());
        }
        FeedView::Loading { partial } => (*partial, true),
        FeedView::Content(items) => (*items, false),
    };

    // heading, blank, separator, detail block, help line
    let reserved = 3 + header.is_some() as usize + 6 + 1;
    let rows = visible_rows(term, reserved);
    for i in list.cursor.window(articles.len(), rows) {
        let title = sanitize_for_terminal(ArticleView::from(&articles[i]).title);
        if i == list.cursor.selected {
            term.write_line(&format!("> {}", style(title).reverse()))?;
        } else {
            term.write_line(&format!("  {}", title))?;
        }
    }
    if loading {
        draw_loader(term)?;
    }
    if let Some(selected) = articles.get(list.cursor.selected) {
        term.write_line(&"-".repeat(40))?;
        for line in render_article(&ArticleView::from(selected)) {
            term.write_line(&line)?;
        }
    }
    term.write_line(
        &style("Arrows/j/k move, Enter opens in browser. 'b' = back, 'q' = quit.")
            .dim()
            .to_string(),
    )?;
    Ok(())
}

pub enum FeedKey {
    Open,
    Back,
    Quit,
    Move(Key),
}

pub fn read_feed_key(term: &Term) -> Result<FeedKey> {
    Ok(match term.read_key()? {
        Key::Enter => FeedKey::Open,
        Key::Char('b') | Key::Char('B') | Key::Escape => FeedKey::Back,
        Key::Char('q') | Key::Char('Q') => FeedKey::Quit,
        other => FeedKey::Move(other),
    })
}

pub fn feed_page_rows(term: &Term) -> usize {
    visible_rows(term, 11)
}
