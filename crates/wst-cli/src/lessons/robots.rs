use lazy_static::lazy_static;
use scraper::{Html, Selector};
use wst_crawler::RespectfulScraper;

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").unwrap();
}

pub fn page_title(html: &Html) -> Option<String> {
    html.select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>())
}

pub async fn run(urls: &[String], user_agent: &str) -> anyhow::Result<()> {
    let scraper = RespectfulScraper::new(user_agent);

    for url in urls {
        println!("\nChecking: {url}");
        if let Some(html) = scraper.scrape(url).await {
            if let Some(title) = page_title(&html) {
                println!("  Page title: {title}");
            }
        }
    }
    Ok(())
}
