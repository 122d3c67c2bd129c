//! URL, email and filename checks for scraped data.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const MAX_FILENAME_LEN: usize = 255;

/// Returns true when `url` has both a scheme and a host.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(url) => !url.scheme().is_empty() && netloc(&url).is_some(),
        Err(_) => false,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Removes characters that are invalid in filenames, replaces spaces with
/// underscores and keeps at most 255 characters.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_FILENAME_LEN)
        .collect()
}

/// The network location of an absolute URL, `host` or `host:port`.
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(netloc)
}

/// `host[:port]` of `url`, the port is only present when it is not the
/// scheme's default one.
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    match url.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_urls_need_scheme_and_host() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:8080/path?q=1"));
        assert!(is_valid_url("ftp://files.example.org/pub"));

        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("file:///tmp/page.html"));
        assert!(!is_valid_url("http://"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("jane.doe+news@mail.example.com"));
        assert!(is_valid_email("a_b%c@d-e.io"));

        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@example.c"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("jane@example.com "));
    }

    #[test]
    fn sanitize_removes_invalid_chars() {
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
        assert_eq!(sanitize_filename("my report 2024.txt"), "my_report_2024.txt");
        assert_eq!(sanitize_filename("what? now.html"), "what_now.html");
    }

    #[test]
    fn sanitize_truncates_to_255_chars() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_filename(&long).len(), 255);

        let accented = "é".repeat(300);
        let sanitized = sanitize_filename(&accented);
        assert_eq!(sanitized.chars().count(), 255);
        assert_eq!(sanitized.len(), 510);

        // Removal happens before truncation
        let padded = format!("{}{}", "*".repeat(100), "y".repeat(255));
        assert_eq!(sanitize_filename(&padded), "y".repeat(255));
    }

    #[test]
    fn domains() {
        assert_eq!(
            extract_domain("https://www.example.com/a/b?c=d"),
            Some("www.example.com".into())
        );
        assert_eq!(
            extract_domain("http://localhost:8000/"),
            Some("localhost:8000".into())
        );
        assert_eq!(
            extract_domain("https://example.com:443/"),
            Some("example.com".into())
        );
        assert_eq!(extract_domain("not a url"), None);
        assert_eq!(extract_domain("mailto:x@example.com"), None);
    }
}
