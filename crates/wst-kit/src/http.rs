//! Page downloads with retries.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::settings::RequestSettings;

/// A downloaded page.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Page {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn build_client(settings: &RequestSettings) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .timeout(settings.timeout())
        .user_agent(&settings.user_agent)
        .build()?;
    Ok(client)
}

/// Downloads `url`, retrying transport errors and server errors up to
/// `settings.max_retries` times.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    settings: &RequestSettings,
) -> anyhow::Result<Page> {
    let mut attempt = 0;
    loop {
        let outcome = match client.get(url).send().await {
            Ok(resp) if resp.status().is_server_error() => {
                Err(anyhow::anyhow!("{url} answered {}", resp.status()))
            }
            Ok(resp) => Ok(resp),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(resp) => {
                let status = resp.status();
                let content_type = resp
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|c| c.to_str().ok())
                    .map(String::from);
                let body = resp.bytes().await?;
                return Ok(Page {
                    url: url.to_string(),
                    status,
                    content_type,
                    body,
                });
            }
            Err(e) if attempt < settings.max_retries => {
                attempt += 1;
                log::warn!(
                    "Attempt {attempt}/{} for {url} failed: {e}",
                    settings.max_retries
                );
                tokio::time::sleep(settings.retry_delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves `500` for the first `failures` requests then `200`.
    async fn flaky_server(failures: usize) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_c = hits.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0; 4096];
                let _ = socket.read(&mut buf).await;
                let n = hits_c.fetch_add(1, Ordering::SeqCst);
                let (status, body) = if n < failures {
                    ("500 Internal Server Error", "oops")
                } else {
                    ("200 OK", "<html><title>ok</title></html>")
                };
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(resp.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });
        (format!("http://{addr}/"), hits)
    }

    fn fast_settings(max_retries: usize) -> RequestSettings {
        RequestSettings {
            timeout_secs: 5,
            max_retries,
            retry_delay_secs: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let (url, hits) = flaky_server(2).await;
        let settings = fast_settings(3);
        let client = build_client(&settings).unwrap();

        let page = fetch(&client, &url, &settings).await.unwrap();
        assert!(page.is_success());
        assert_eq!(page.content_type.as_deref(), Some("text/html"));
        assert_eq!(page.text(), "<html><title>ok</title></html>");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (url, hits) = flaky_server(10).await;
        let settings = fast_settings(1);
        let client = build_client(&settings).unwrap();

        assert!(fetch(&client, &url, &settings).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
