//! Common helpers used across the scraping lessons.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::settings::DEFAULT_USER_AGENT;

/// A random delay drawn uniformly between two bounds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    pub min_delay: f64,
    pub max_delay: f64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            min_delay: 1.0,
            max_delay: 3.0,
        }
    }
}

impl RateLimit {
    pub fn new(min_delay: f64, max_delay: f64) -> Self {
        Self {
            min_delay,
            max_delay,
        }
    }

    pub fn delay(&self) -> Duration {
        let lo = self.min_delay.min(self.max_delay).max(0.0);
        let hi = self.min_delay.max(self.max_delay).max(0.0);
        let secs = rand::thread_rng().gen_range(lo..=hi);
        Duration::from_secs_f64(secs)
    }

    pub async fn wait(&self) {
        let delay = self.delay();
        log::debug!("Rate limiting for {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }

    /// Same as [`RateLimit::wait`] for code running outside of a runtime.
    pub fn wait_blocking(&self) {
        let delay = self.delay();
        log::debug!("Rate limiting for {:.2}s", delay.as_secs_f64());
        thread::sleep(delay);
    }

    /// Sleeps for a random delay then runs `f`.
    pub async fn call<F, Fut>(&self, f: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.wait().await;
        f().await
    }
}

/// Browser-like request headers, `custom` pairs are added on top.
pub fn get_headers<I, K, V>(custom: I) -> anyhow::Result<HeaderMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    for (name, value) in custom {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())?;
        let value = HeaderValue::from_str(value.as_ref())?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Collapses text spread over several lines into a single line.
pub fn clean_text(text: &str) -> String {
    text.split(is_line_boundary)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First descendant of `scope` matching `css`, `None` when nothing matches
/// or when `css` is not a valid selector.
pub fn safe_find<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).next(),
        Err(e) => {
            log::debug!("Invalid selector {css:?}: {e}");
            None
        }
    }
}

pub fn safe_get_text(element: Option<ElementRef>, default: &str) -> String {
    match element {
        Some(element) => clean_text(&element.text().collect::<String>()),
        None => default.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    #[default]
    Write,
    Append,
}

impl From<FileMode> for fs_err::OpenOptions {
    fn from(mode: FileMode) -> Self {
        let mut opts = fs_err::OpenOptions::new();
        match mode {
            FileMode::Write => opts.write(true).create(true).truncate(true),
            FileMode::Append => opts.append(true).create(true),
        };
        opts
    }
}

pub fn save_to_file<P: AsRef<Path>>(data: &str, path: P, mode: FileMode) -> anyhow::Result<()> {
    let path = path.as_ref();
    let opts: fs_err::OpenOptions = mode.into();
    let mut file = opts.open(path)?;
    file.write_all(data.as_bytes())?;
    log::info!("Data saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use scraper::Html;

    use super::*;

    #[test]
    fn rate_limit_bounds() {
        let limit = RateLimit::new(0.2, 0.4);
        for _ in 0..100 {
            let d = limit.delay().as_secs_f64();
            assert!((0.2..=0.4).contains(&d), "{d}");
        }

        let swapped = RateLimit::new(0.4, 0.2);
        for _ in 0..100 {
            let d = swapped.delay().as_secs_f64();
            assert!((0.2..=0.4).contains(&d), "{d}");
        }

        assert_eq!(RateLimit::new(-1.0, -0.5).delay(), Duration::ZERO);
        assert_eq!(RateLimit::new(0.5, 0.5).delay(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn rate_limited_call_returns_output() {
        let limit = RateLimit::new(0.0, 0.01);
        let out = limit.call(|| async { 21 * 2 }).await;
        assert_eq!(out, 42);
    }

    #[test]
    fn blocking_wait_sleeps_within_bounds() {
        let begin = std::time::Instant::now();
        RateLimit::new(0.1, 0.15).wait_blocking();
        assert!(begin.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn default_headers() {
        let headers = get_headers(Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(headers.len(), 6);
        assert_eq!(headers["user-agent"], DEFAULT_USER_AGENT);
        assert_eq!(headers["accept-language"], "en-US,en;q=0.5");
        assert_eq!(headers["upgrade-insecure-requests"], "1");
    }

    #[test]
    fn custom_headers_override() {
        let custom = HashMap::from([("User-Agent", "MyBot/1.0"), ("Referer", "https://a.b/")]);
        let headers = get_headers(custom).unwrap();
        assert_eq!(headers.len(), 7);
        assert_eq!(headers["user-agent"], "MyBot/1.0");
        assert_eq!(headers["referer"], "https://a.b/");

        assert!(get_headers([("bad header", "x")]).is_err());
    }

    #[test]
    fn clean_text_collapses_lines() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n \n"), "");
        assert_eq!(
            clean_text("  Hello \n\n   brave  \r\n new world  "),
            "Hello brave new world"
        );
        assert_eq!(clean_text("a\u{2028}b\x0cc"), "a b c");
    }

    #[test]
    fn safe_lookups() {
        let html = Html::parse_document(
            r#"<div class="card"><h2>  Widget
                 Pro </h2><span class="price">$10</span></div>"#,
        );
        let root = html.root_element();

        let title = safe_find(root, "div.card h2");
        assert_eq!(safe_get_text(title, "n/a"), "Widget Pro");

        assert!(safe_find(root, "div.missing").is_none());
        assert!(safe_find(root, "<<not css>>").is_none());
        assert_eq!(safe_get_text(safe_find(root, "p"), "n/a"), "n/a");
    }

    #[test]
    fn save_write_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        save_to_file("first\n", &path, FileMode::Write).unwrap();
        save_to_file("second\n", &path, FileMode::Append).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        save_to_file("reset\n", &path, FileMode::Write).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "reset\n");
    }
}
