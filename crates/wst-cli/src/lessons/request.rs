use reqwest::StatusCode;
use wst_kit::{build_client, fetch, Page, RequestSettings};

/// Lines printed for a downloaded page.
pub fn summary(page: &Page) -> Vec<String> {
    if page.status != StatusCode::OK {
        return vec![format!(
            "✗ Request failed with status code: {}",
            page.status.as_u16()
        )];
    }

    vec![
        String::from("✓ Request successful!"),
        format!("Status Code: {}", page.status.as_u16()),
        format!(
            "Content Type: {}",
            page.content_type.as_deref().unwrap_or("None")
        ),
        format!("Content Length: {} bytes", page.body.len()),
        String::from("\nFirst 500 characters of response:"),
        page.text().chars().take(500).collect(),
    ]
}

pub async fn run(url: &str, settings: &RequestSettings) -> anyhow::Result<()> {
    println!("Fetching: {url}");
    let client = build_client(settings)?;
    let page = fetch(&client, url, settings).await?;
    for line in summary(&page) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(status: StatusCode, text: &str) -> Page {
        Page {
            url: String::from("https://example.com"),
            status,
            content_type: Some(String::from("text/html; charset=UTF-8")),
            body: text.as_bytes().to_vec().into(),
        }
    }

    #[test]
    fn successful_request() {
        let text = "x".repeat(600);
        let lines = summary(&page(StatusCode::OK, &text));
        assert_eq!(lines[0], "✓ Request successful!");
        assert_eq!(lines[1], "Status Code: 200");
        assert_eq!(lines[2], "Content Type: text/html; charset=UTF-8");
        assert_eq!(lines[3], "Content Length: 600 bytes");
        assert_eq!(lines[5].len(), 500);
    }

    #[test]
    fn failed_request() {
        let lines = summary(&page(StatusCode::NOT_FOUND, "missing"));
        assert_eq!(lines, vec!["✗ Request failed with status code: 404"]);
    }
}
