use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use scraper::Html;
use tokio::sync::mpsc;
use url::Url;

/// Crawling logic of one site: where to start and how to read its pages.
///
/// Each crawler worker owns its own spider built with [`Spider::new`].
pub trait Spider {
    type Config: Clone + Send + 'static;
    type Item: Send + 'static;

    fn new(config: &Self::Config) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn name(&self) -> &str;

    /// Domains that followed links may point to, any domain when empty.
    fn allowed_domains(&self) -> Vec<String> {
        Vec::new()
    }

    fn start_urls(&self) -> Vec<String>;

    fn parse(&mut self, response: &Response) -> anyhow::Result<ParseOutput<Self::Item>>;
}

#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

impl Response {
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Resolves `href` against the page URL.
    pub fn follow(&self, href: &str) -> Option<Url> {
        self.url.join(href.trim()).ok()
    }
}

#[derive(Debug)]
pub struct ParseOutput<I> {
    pub items: Vec<I>,
    pub requests: Vec<Url>,
}

impl<I> Default for ParseOutput<I> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            requests: Vec::new(),
        }
    }
}

impl<I> ParseOutput<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: I) {
        self.items.push(item);
    }

    pub fn add_request(&mut self, url: Url) {
        self.requests.push(url);
    }

    /// Schedules `href` relative to `response`, returns false when it
    /// isn't a valid URL.
    pub fn follow(&mut self, response: &Response, href: &str) -> bool {
        match response.follow(href) {
            Some(url) => {
                self.requests.push(url);
                true
            }
            None => false,
        }
    }
}

/// Drops requests to domains a spider didn't allow.
#[derive(Debug, Clone, Default)]
pub struct OffsiteFilter {
    domains: Vec<String>,
}

impl OffsiteFilter {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    pub fn allows(&self, url: &Url) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        self.domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
    }
}

/// URL sender counting scheduled pages and skipping already seen URLs.
#[derive(Debug, Clone)]
pub struct CountedTx {
    tx: mpsc::UnboundedSender<Url>,
    counter: Arc<AtomicUsize>,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl CountedTx {
    pub fn new(tx: mpsc::UnboundedSender<Url>, counter: Arc<AtomicUsize>) -> Self {
        Self {
            tx,
            counter,
            seen: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Schedules `url` unless it was seen before or isn't http(s).
    /// Returns true when the URL was scheduled.
    pub fn send(&self, url: Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            log::debug!("Ignoring non HTTP URL: {url}");
            return false;
        }

        let mut key = url.clone();
        key.set_fragment(None);
        let first_visit = match self.seen.lock() {
            Ok(mut seen) => seen.insert(key.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(key.to_string()),
        };
        if !first_visit {
            log::trace!("Already scheduled: {url}");
            return false;
        }

        // Must be counted before the downloader can see it
        self.counter.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(url) {
            Ok(()) => true,
            Err(e) => {
                self.counter.fetch_sub(1, Ordering::SeqCst);
                log::error!("Couldn't send URL: {e}");
                false
            }
        }
    }
}
