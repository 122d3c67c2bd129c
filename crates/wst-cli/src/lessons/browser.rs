//! WebDriver lesson, needs a running driver such as chromedriver.

use wst_kit::BrowserSettings;

#[cfg(feature = "browser")]
mod session {
    use std::time::Duration;

    use fantoccini::wd::{Capabilities, TimeoutConfiguration};
    use fantoccini::{Client, ClientBuilder, Locator};
    use serde_json::json;
    use wst_kit::BrowserSettings;

    pub fn capabilities(settings: &BrowserSettings) -> Capabilities {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if settings.headless {
            args.push("--headless");
        }
        let mut caps = Capabilities::new();
        caps.insert(String::from("browserName"), json!("chrome"));
        caps.insert(String::from("goog:chromeOptions"), json!({ "args": args }));
        caps
    }

    async fn tour(client: &Client, settings: &BrowserSettings, url: &str) -> anyhow::Result<()> {
        let implicit_wait = Duration::from_secs(settings.implicit_wait_secs);
        client
            .update_timeouts(TimeoutConfiguration::new(
                None,
                Some(Duration::from_secs(settings.page_load_timeout_secs)),
                Some(implicit_wait),
            ))
            .await?;

        println!("Opening {url}...");
        client.goto(url).await?;
        println!("Page title: {}", client.title().await?);

        let heading = client.find(Locator::Css("h1")).await?;
        println!("Main heading: {}", heading.text().await?);

        let links = client.find_all(Locator::Css("a")).await?;
        println!("\nFound {} links:", links.len());
        for link in links {
            let href = link.attr("href").await?.unwrap_or_default();
            println!("- {}: {href}", link.text().await?);
        }

        client
            .wait()
            .at_most(implicit_wait)
            .for_element(Locator::Css("body"))
            .await?;
        println!("\nPage loaded successfully!");

        let source = client.source().await?;
        println!("Page source length: {} characters", source.chars().count());
        Ok(())
    }

    pub async fn run(settings: &BrowserSettings, url: &str) -> anyhow::Result<()> {
        let client = ClientBuilder::native()
            .capabilities(capabilities(settings))
            .connect(&settings.webdriver_url)
            .await?;

        let res = tour(&client, settings, url).await;

        println!("\nClosing browser...");
        if let Err(e) = client.close().await {
            log::warn!("Couldn't close the browser: {e}");
        }
        res
    }

}

#[cfg(feature = "browser")]
pub async fn run(settings: &BrowserSettings, url: &str) -> anyhow::Result<()> {
    session::run(settings, url).await
}

#[cfg(not(feature = "browser"))]
pub async fn run(settings: &BrowserSettings, url: &str) -> anyhow::Result<()> {
    log::debug!("Would open {url} through {}", settings.webdriver_url);
    anyhow::bail!("wst was built without the `browser` feature, rebuild with `--features browser`")
}
