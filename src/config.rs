use crate::news::DEFAULT_BASE_URL;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

pub const DEFAULT_COUNTRY: &str = "in";
pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_PAGE_SIZE: u32 = 8;
const MAX_PAGE_SIZE: u32 = 100;
const API_KEY_ENV: &str = "NEWSAPI_KEY";

/// Inputs of one mounted feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub country: String,
    pub category: String,
    pub api_key: String,
    pub page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.into(),
            category: DEFAULT_CATEGORY.into(),
            api_key: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// On-disk `config.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub base_url: Option<String>,
    pub header: Option<String>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<String>,
    pub api_key: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub country: String,
    pub default_category: String,
    pub page_size: u32,
    pub categories: Vec<String>,
    pub base_url: String,
    pub header: Option<String>,
}

impl RuntimeConfig {
    pub fn feed_config(&self, category: &str) -> FeedConfig {
        FeedConfig {
            country: self.country.clone(),
            category: category.to_string(),
            api_key: self.api_key.clone(),
            page_size: self.page_size,
        }
    }
}

pub fn default_categories() -> Vec<String> {
    [
        "business",
        "entertainment",
        "general",
        "health",
        "science",
        "sports",
        "technology",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn load(overrides: Overrides) -> Result<RuntimeConfig> {
    let file = match overrides.config_path.as_deref() {
        Some(path) => read_file(&PathBuf::from(path))?,
        None => match default_config_path() {
            Some(path) if path.is_file() => read_file(&path)?,
            _ => AppConfig::default(),
        },
    };
    resolve(file, overrides, env::var(API_KEY_ENV).ok())
}

fn read_file(path: &PathBuf) -> Result<AppConfig> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let parsed: AppConfig = toml::from_str(&txt)
        .with_context(|| format!("failed to parse toml: {}", path.display()))?;
    Ok(parsed)
}

fn resolve(file: AppConfig, overrides: Overrides, env_key: Option<String>) -> Result<RuntimeConfig> {
    let api_key = overrides
        .api_key
        .or(file.api_key)
        .or(env_key)
        .filter(|k| !k.trim().is_empty());
    let Some(api_key) = api_key else {
        bail!("no NewsAPI key: pass --api-key, set api_key in config.toml, or export {API_KEY_ENV}");
    };

    let page_size = overrides.page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        bail!("page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}");
    }

    let categories = file
        .categories
        .filter(|c| !c.is_empty())
        .unwrap_or_else(default_categories);

    Ok(RuntimeConfig {
        api_key,
        country: overrides
            .country
            .or(file.country)
            .unwrap_or_else(|| DEFAULT_COUNTRY.into()),
        default_category: overrides
            .category
            .or(file.category)
            .unwrap_or_else(|| DEFAULT_CATEGORY.into()),
        page_size,
        categories,
        base_url: file.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        header: file.header,
    })
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("headlines-cli");
        p.push("config.toml");
        return Some(p);
    }
    if let Ok(home) = env::var("HOME") {
        let mut p = PathBuf::from(home);
        p.push(".config");
        p.push("headlines-cli");
        p.push("config.toml");
        return Some(p);
    }
    None
}
