mod config;
mod logging;
mod news;
mod open_url;
mod ui;
mod util;

use anyhow::{Context, Result};
use console::Term;
use std::env;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args = env::args().skip(1);
    let mut overrides = config::Overrides::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => overrides.config_path = args.next(),
            "--api-key" => overrides.api_key = args.next(),
            "--country" => overrides.country = args.next(),
            "--category" => overrides.category = args.next(),
            "--page-size" => {
                if let Some(n) = args.next() {
                    let n = n
                        .parse::<u32>()
                        .with_context(|| format!("--page-size expects a number, got {n}"))?;
                    overrides.page_size = Some(n);
                }
            }
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            other => debug!(arg = other, "ignoring unknown argument"),
        }
    }

    let cfg = config::load(overrides)?;
    let _ = Term::stdout().clear_screen();

    let mut labels: Vec<String> = cfg.categories.iter().map(|c| news::capitalize(c)).collect();
    labels.push("Quit".into());
    let quit_index = cfg.categories.len();
    let mut default = cfg
        .categories
        .iter()
        .position(|c| c.eq_ignore_ascii_case(&cfg.default_category));

    let mut reader = news::Reader::new(&cfg)?;
    loop {
        let sel = ui::prompt_menu(
            "Top Headlines: pick a category (b = back/quit)",
            &labels,
            default,
            cfg.header.as_deref(),
        )?;
        match sel {
            ui::MenuChoice::Back | ui::MenuChoice::Quit => break,
            ui::MenuChoice::Index(i) if i == quit_index => break,
            ui::MenuChoice::Index(i) => {
                default = Some(i);
                match reader.run(&cfg, &cfg.categories[i]).await? {
                    news::FeedExit::Quit => break,
                    news::FeedExit::Back => {}
                }
            }
        }
    }

    let _ = Term::stdout().clear_screen();
    Ok(())
}

fn print_help() {
    println!("headlines");
    println!("Usage: headlines [--config <path>] [--api-key <key>] [--country <cc>] [--category <name>] [--page-size <n>]");
    println!("  --config <path>     Path to a config.toml");
    println!("  --api-key <key>     NewsAPI key (falls back to api_key in config, then NEWSAPI_KEY)");
    println!("  --country <cc>      Two-letter country code (default: in)");
    println!("  --category <name>   Category preselected in the menu (default: general)");
    println!("  --page-size <n>     Articles per page, 1-100 (default: 8)");
}
