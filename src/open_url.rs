use anyhow::{bail, Context, Result};
use url::Url;

/// Open an article link in the system browser. Only http(s) links are
/// handed to the OS; article URLs come from a third party.
pub fn open_url(link: &str) -> Result<()> {
    let url = checked_link(link)?;
    open::that(url.as_str()).with_context(|| format!("no browser accepted {}", url))?;
    Ok(())
}

fn checked_link(link: &str) -> Result<Url> {
    let url = Url::parse(link.trim()).with_context(|| format!("not a url: {link}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("refusing to open {other}: link"),
    }
}
