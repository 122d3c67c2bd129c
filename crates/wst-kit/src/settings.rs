use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::helpers::RateLimit;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const TUTORIAL_USER_AGENT: &str =
    "Tutorial Scraper (+https://github.com/Jasonyou1995/web-scraping-tutorial)";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub paths: Paths,

    #[serde(default)]
    pub request: RequestSettings,

    #[serde(default)]
    pub browser: BrowserSettings,
}

/// Reads a yaml settings file into `T`.
pub fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let file = fs_err::File::open(path.as_ref())?;
    Ok(serde_yaml::from_reader(file)?)
}

impl Settings {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        load_yaml(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paths {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Paths {
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir().join("outputs")
    }

    pub fn sample_pages_dir(&self) -> PathBuf {
        self.data_dir().join("sample_pages")
    }

    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        fs_err::create_dir_all(self.output_dir())?;
        fs_err::create_dir_all(self.sample_pages_dir())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_min_request_delay")]
    pub min_request_delay: f64,

    #[serde(default = "default_max_request_delay")]
    pub max_request_delay: f64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            min_request_delay: default_min_request_delay(),
            max_request_delay: default_max_request_delay(),
            user_agent: default_user_agent(),
        }
    }
}

impl RequestSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::new(self.min_request_delay, self.max_request_delay)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_min_request_delay() -> f64 {
    1.0
}

fn default_max_request_delay() -> f64 {
    3.0
}

fn default_user_agent() -> String {
    String::from(DEFAULT_USER_AGENT)
}

/// WebDriver session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSettings {
    #[serde(default = "default_implicit_wait_secs")]
    pub implicit_wait_secs: u64,

    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            implicit_wait_secs: default_implicit_wait_secs(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            headless: default_headless(),
            webdriver_url: default_webdriver_url(),
        }
    }
}

fn default_implicit_wait_secs() -> u64 {
    10
}

fn default_page_load_timeout_secs() -> u64 {
    30
}

fn default_headless() -> bool {
    true
}

fn default_webdriver_url() -> String {
    String::from("http://localhost:9515")
}
