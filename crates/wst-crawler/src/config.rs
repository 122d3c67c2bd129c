use std::cmp;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_robots_txt_obey")]
    pub robots_txt_obey: bool,

    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    #[serde(default = "default_throttle")]
    pub throttle: Option<Throttle>,

    #[serde(default = "default_randomize_delay")]
    pub randomize_delay: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_page_buffer")]
    pub page_buffer: usize,

    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    #[serde(default = "default_handle_sigint")]
    pub handle_sigint: bool,

    #[serde(default = "default_on_dl_error")]
    pub on_dl_error: OnError,

    #[serde(default = "default_on_scrap_error")]
    pub on_scrap_error: OnError,

    #[serde(default = "default_on_robots_error")]
    pub on_robots_error: OnError,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            user_agent: default_user_agent(),
            robots_txt_obey: default_robots_txt_obey(),
            concurrent_requests: default_concurrent_requests(),
            throttle: default_throttle(),
            randomize_delay: default_randomize_delay(),
            request_timeout_secs: default_request_timeout_secs(),
            page_buffer: default_page_buffer(),
            num_workers: default_num_workers(),
            handle_sigint: default_handle_sigint(),
            on_dl_error: default_on_dl_error(),
            on_scrap_error: default_on_scrap_error(),
            on_robots_error: default_on_robots_error(),
        }
    }
}

impl CrawlerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrent_requests == 0 {
            anyhow::bail!("Invalid crawler config, `concurrentRequests` must be at least 1");
        }
        if self.num_workers == 0 {
            anyhow::bail!("Invalid crawler config, `numWorkers` must be at least 1");
        }
        if let Some(Throttle::Delay(delay)) = self.throttle {
            if !(delay >= 0.0 && delay.is_finite()) {
                anyhow::bail!("Invalid crawler config, download delay must be >= 0, got {delay}");
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_bot_name() -> String {
    String::from("tutorial_scrapy")
}

fn default_user_agent() -> String {
    String::from("tutorial_scrapy (+https://github.com/Jasonyou1995/web-scraping-tutorial)")
}

fn default_robots_txt_obey() -> bool {
    true
}

fn default_concurrent_requests() -> usize {
    16
}

fn default_throttle() -> Option<Throttle> {
    Some(Throttle::Delay(2.0))
}

fn default_randomize_delay() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_page_buffer() -> usize {
    10_000
}

fn default_num_workers() -> usize {
    cmp::max(1, num_cpus::get().saturating_sub(2))
}

fn default_handle_sigint() -> bool {
    true
}

fn default_on_dl_error() -> OnError {
    OnError::SkipAndLog
}

fn default_on_scrap_error() -> OnError {
    OnError::SkipAndLog
}

fn default_on_robots_error() -> OnError {
    OnError::SkipAndLog
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Throttle {
    /// The number of requests per second
    PerSecond(NonZeroUsize),
    /// The delay in seconds between requests
    Delay(f32),
}
