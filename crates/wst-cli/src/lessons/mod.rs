//! One module per lesson, each printing what it finds.

use std::path::Path;

use url::Url;
use wst_kit::{build_client, fetch, RequestSettings};

use crate::PageArgs;

pub mod browser;
pub mod crawl;
pub mod exercise;
pub mod hello;
pub mod links;
pub mod parse;
pub mod products;
pub mod request;
pub mod robots;
pub mod selectors;

const DEFAULT_URL: &str = "https://example.com";

/// Reads the page given on the command line, returns its html and the URL
/// relative links resolve against.
pub async fn load_page(
    args: &PageArgs,
    settings: &RequestSettings,
) -> anyhow::Result<(String, Url)> {
    if let Some(file) = &args.file {
        let html = fs_err::read_to_string(file)?;
        return Ok((html, file_url(file)?));
    }

    let url = args.url.as_deref().unwrap_or(DEFAULT_URL);
    let client = build_client(settings)?;
    let page = fetch(&client, url, settings).await?;
    if !page.is_success() {
        log::warn!("{url} answered {}", page.status);
    }
    Ok((page.text(), Url::parse(url)?))
}

fn file_url(path: &Path) -> anyhow::Result<Url> {
    let path = fs_err::canonicalize(path)?;
    Url::from_file_path(&path)
        .map_err(|_| anyhow::anyhow!("Invalid file path {}", path.display()))
}

/// First `max` characters of `text`, followed by `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
