mod common;

use std::time::{Duration, Instant};

use common::StubSite;
use scraper::Selector;
use wst_crawler::RespectfulScraper;

fn scraper(agent: &str) -> RespectfulScraper {
    RespectfulScraper::new(agent).with_polite_delay(Duration::ZERO)
}

#[tokio::test]
async fn follows_robots_rules() {
    let site = StubSite::start(vec![
        (
            "/robots.txt",
            200,
            String::from("User-agent: *\nDisallow: /private/\n\nUser-agent: BadBot\nDisallow: /\n"),
        ),
        (
            "/",
            200,
            String::from("<html><head><title>Home</title></head></html>"),
        ),
    ])
    .await;

    let polite = scraper("MyBot");
    assert!(polite.can_fetch(&site.url("/")).await);
    assert!(!polite.can_fetch(&site.url("/private/data")).await);

    let html = polite.scrape(&site.url("/")).await.unwrap();
    let title = Selector::parse("title").unwrap();
    let title = html.select(&title).next().unwrap().text().collect::<String>();
    assert_eq!(title, "Home");

    assert!(polite.scrape(&site.url("/private/data")).await.is_none());
    assert!(polite.scrape(&site.url("/missing")).await.is_none());
    assert_eq!(site.hit_count("/robots.txt"), 1);
    assert_eq!(site.hit_count("/private/data"), 0);

    let bad = scraper("BadBot");
    assert!(!bad.can_fetch(&site.url("/")).await);
}

#[tokio::test]
async fn robots_status_codes() {
    let forbidden = StubSite::start(vec![("/robots.txt", 403, String::new())]).await;
    assert!(!scraper("*").can_fetch(&forbidden.url("/")).await);

    let broken = StubSite::start(vec![("/robots.txt", 500, String::new())]).await;
    assert!(!scraper("*").can_fetch(&broken.url("/")).await);

    let missing = StubSite::start(vec![]).await;
    assert!(scraper("*").can_fetch(&missing.url("/anything")).await);
}

#[tokio::test]
async fn unreachable_robots_allows() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let polite = scraper("*");
    assert!(polite.can_fetch(&format!("http://{addr}/page")).await);
    assert!(polite.scrape(&format!("http://{addr}/page")).await.is_none());
}

#[tokio::test]
async fn honors_crawl_delay() {
    let site = StubSite::start(vec![(
        "/robots.txt",
        200,
        String::from("User-agent: *\nCrawl-delay: 0.3\n"),
    )])
    .await;

    let polite = scraper("*");
    let begin = Instant::now();
    assert!(polite.can_fetch(&site.url("/")).await);
    assert!(begin.elapsed() >= Duration::from_millis(300));

    let hasty = scraper("*").with_crawl_delay(false);
    let begin = Instant::now();
    assert!(hasty.can_fetch(&site.url("/")).await);
    assert!(begin.elapsed() < Duration::from_millis(300));
}
