//! robots.txt policies, cached per origin.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use texting_robots::Robot;
use tokio::sync::Mutex;
use url::Url;

/// What a site's robots.txt allows for one user agent.
pub enum RobotsPolicy {
    Rules(Robot),
    AllowAll,
    DisallowAll,
}

impl fmt::Debug for RobotsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules(robot) => f
                .debug_struct("Rules")
                .field("delay", &robot.delay)
                .finish_non_exhaustive(),
            Self::AllowAll => write!(f, "AllowAll"),
            Self::DisallowAll => write!(f, "DisallowAll"),
        }
    }
}

impl RobotsPolicy {
    /// Builds the policy from a robots.txt answer.
    ///
    /// 401 and 403 forbid the whole site, other client errors allow it,
    /// server errors forbid it. A body that can't be parsed allows it.
    pub fn from_response(agent: &str, status: StatusCode, body: &[u8]) -> Self {
        match status.as_u16() {
            200..=299 => match Robot::new(agent, body) {
                Ok(robot) => Self::Rules(robot),
                Err(e) => {
                    log::warn!("Couldn't parse robots.txt, allowing all: {e}");
                    Self::AllowAll
                }
            },
            401 | 403 => Self::DisallowAll,
            400..=499 => Self::AllowAll,
            500..=599 => Self::DisallowAll,
            _ => Self::AllowAll,
        }
    }

    pub fn allowed(&self, url: &str) -> bool {
        match self {
            Self::Rules(robot) => robot.allowed(url),
            Self::AllowAll => true,
            Self::DisallowAll => false,
        }
    }

    pub fn crawl_delay(&self) -> Option<Duration> {
        match self {
            Self::Rules(robot) => robot
                .delay
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(Duration::from_secs_f32),
            Self::AllowAll | Self::DisallowAll => None,
        }
    }
}

/// `scheme://host[:port]` of `url`, `None` for URLs without a host.
pub fn origin(url: &Url) -> Option<String> {
    url.host_str()?;
    Some(url.origin().ascii_serialization())
}

pub fn robots_url(url: &Url) -> Option<String> {
    origin(url).map(|origin| format!("{origin}/robots.txt"))
}

/// Loads robots.txt files on demand and keeps one policy per origin.
///
/// Failed downloads are not cached so they are attempted again on the
/// next lookup.
#[derive(Debug)]
pub struct RobotsCache {
    client: reqwest::Client,
    user_agent: String,
    policies: Mutex<HashMap<String, Arc<RobotsPolicy>>>,
}

impl RobotsCache {
    pub fn new(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            policies: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn cached(&self, url: &Url) -> Option<Arc<RobotsPolicy>> {
        let origin = origin(url)?;
        self.policies.lock().await.get(&origin).cloned()
    }

    pub async fn insert(&self, url: &Url, policy: RobotsPolicy) -> Option<Arc<RobotsPolicy>> {
        let origin = origin(url)?;
        let policy = Arc::new(policy);
        self.policies.lock().await.insert(origin, policy.clone());
        Some(policy)
    }

    /// Policy for the origin of `url`, downloading its robots.txt if needed.
    pub async fn policy(&self, url: &Url) -> anyhow::Result<Arc<RobotsPolicy>> {
        if let Some(policy) = self.cached(url).await {
            return Ok(policy);
        }

        let robots_url =
            robots_url(url).ok_or_else(|| anyhow::anyhow!("No robots.txt for {url}"))?;
        let resp = self
            .client
            .get(&robots_url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Couldn't load {robots_url}: {e}"))?;
        let status = resp.status();
        let body = resp.bytes().await?;
        let policy = RobotsPolicy::from_response(&self.user_agent, status, &body);
        log::info!("Loaded robots.txt from {robots_url} ({status})");

        self.insert(url, policy)
            .await
            .ok_or_else(|| anyhow::anyhow!("No robots.txt for {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "\
User-agent: *
Disallow: /private/
Crawl-delay: 1.5

User-agent: BadBot
Disallow: /
";

    #[test]
    fn rules_from_body() {
        let policy = RobotsPolicy::from_response("*", StatusCode::OK, ROBOTS.as_bytes());
        assert!(policy.allowed("https://example.com/"));
        assert!(policy.allowed("https://example.com/page1"));
        assert!(!policy.allowed("https://example.com/private/data"));
        assert_eq!(policy.crawl_delay(), Some(Duration::from_millis(1500)));

        let bad = RobotsPolicy::from_response("BadBot", StatusCode::OK, ROBOTS.as_bytes());
        assert!(!bad.allowed("https://example.com/page1"));
    }

    #[test]
    fn status_codes() {
        let forbidden = RobotsPolicy::from_response("*", StatusCode::FORBIDDEN, b"");
        assert!(!forbidden.allowed("https://example.com/"));

        let unauthorized = RobotsPolicy::from_response("*", StatusCode::UNAUTHORIZED, b"");
        assert!(!unauthorized.allowed("https://example.com/"));

        let missing = RobotsPolicy::from_response("*", StatusCode::NOT_FOUND, b"");
        assert!(missing.allowed("https://example.com/anything"));
        assert_eq!(missing.crawl_delay(), None);

        let broken = RobotsPolicy::from_response("*", StatusCode::BAD_GATEWAY, b"");
        assert!(!broken.allowed("https://example.com/"));
    }

    #[test]
    fn origins() {
        let url = Url::parse("https://example.com/a/b?c=d#e").unwrap();
        assert_eq!(origin(&url).as_deref(), Some("https://example.com"));
        assert_eq!(
            robots_url(&url).as_deref(),
            Some("https://example.com/robots.txt")
        );

        let url = Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(
            robots_url(&url).as_deref(),
            Some("http://127.0.0.1:8080/robots.txt")
        );

        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(origin(&url), None);
    }
}
