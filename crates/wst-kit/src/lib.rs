pub mod helpers;
pub mod http;
pub mod logging;
pub mod settings;
pub mod validators;

pub use helpers::{
    clean_text, get_headers, safe_find, safe_get_text, save_to_file, FileMode, RateLimit,
};
pub use http::{build_client, fetch, Page};
pub use settings::{
    BrowserSettings, Paths, RequestSettings, Settings, DEFAULT_USER_AGENT, TUTORIAL_USER_AGENT,
};
pub use validators::{extract_domain, is_valid_email, is_valid_url, netloc, sanitize_filename};

pub use anyhow;
