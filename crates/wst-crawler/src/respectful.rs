use std::time::Duration;

use lazy_static::lazy_static;
use reqwest::header::USER_AGENT;
use scraper::Html;
use url::Url;
use wst_kit::TUTORIAL_USER_AGENT;

use crate::robots::{robots_url, RobotsCache};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const POLITE_DELAY: Duration = Duration::from_secs(1);

lazy_static! {
    static ref HTTP_CLI: reqwest::Client = reqwest::ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap();
}

/// Single page scraper that checks robots.txt before every download.
#[derive(Debug)]
pub struct RespectfulScraper {
    robots: RobotsCache,
    polite_delay: Duration,
    honor_crawl_delay: bool,
}

impl Default for RespectfulScraper {
    fn default() -> Self {
        Self::new("*")
    }
}

impl RespectfulScraper {
    /// `user_agent` is the name matched against robots.txt groups.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            robots: RobotsCache::new(HTTP_CLI.clone(), user_agent),
            polite_delay: POLITE_DELAY,
            honor_crawl_delay: true,
        }
    }

    pub fn with_polite_delay(mut self, delay: Duration) -> Self {
        self.polite_delay = delay;
        self
    }

    pub fn with_crawl_delay(mut self, honor: bool) -> Self {
        self.honor_crawl_delay = honor;
        self
    }

    pub fn user_agent(&self) -> &str {
        self.robots.user_agent()
    }

    /// Whether robots.txt lets us fetch `url`. Sleeps for the site's crawl
    /// delay when it does.
    ///
    /// A robots.txt that can't be loaded allows everything.
    pub async fn can_fetch(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Could not load robots.txt for {url}: {e}");
                return true;
            }
        };

        let policy = match self.robots.policy(&parsed).await {
            Ok(policy) => policy,
            Err(e) => {
                log::warn!("Could not load robots.txt: {e}");
                return true;
            }
        };

        let allowed = policy.allowed(parsed.as_str());
        if allowed && self.honor_crawl_delay {
            if let Some(delay) = policy.crawl_delay() {
                log::info!("Respecting crawl delay: {}s", delay.as_secs_f32());
                tokio::time::sleep(delay).await;
            }
        }
        allowed
    }

    /// Downloads and parses `url` when robots.txt allows it.
    pub async fn scrape(&self, url: &str) -> Option<Html> {
        if !self.can_fetch(url).await {
            log::warn!("Scraping not allowed by robots.txt: {url}");
            return None;
        }
        log::info!("Scraping allowed: {url}");

        tokio::time::sleep(self.polite_delay).await;

        let body = async {
            let resp = HTTP_CLI
                .get(url)
                .header(USER_AGENT, TUTORIAL_USER_AGENT)
                .send()
                .await?
                .error_for_status()?;
            resp.text().await
        };
        match body.await {
            Ok(body) => Some(Html::parse_document(&body)),
            Err(e) => {
                log::error!("Error fetching {url}: {e}");
                None
            }
        }
    }

    /// robots.txt location checked for `url`.
    pub fn robots_url_for(url: &str) -> Option<String> {
        Url::parse(url).ok().as_ref().and_then(robots_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_location() {
        assert_eq!(
            RespectfulScraper::robots_url_for("https://example.com/page1?q=1").as_deref(),
            Some("https://example.com/robots.txt")
        );
        assert_eq!(
            RespectfulScraper::robots_url_for("http://localhost:8080/a/b").as_deref(),
            Some("http://localhost:8080/robots.txt")
        );
        assert_eq!(RespectfulScraper::robots_url_for("not a url"), None);
    }

    #[test]
    fn defaults_to_any_agent() {
        assert_eq!(RespectfulScraper::default().user_agent(), "*");
        assert_eq!(RespectfulScraper::new("MyBot").user_agent(), "MyBot");
    }
}
