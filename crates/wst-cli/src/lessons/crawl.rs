use std::path::Path;

use wst_crawler::{
    crawl_site, CleanDataPipeline, CrawlStats, CrawlerConfig, FeedConfig, FeedWriter,
    ItemPipelines,
};

use crate::spiders::quotes::{QuotesConfig, QuotesSpider};

pub fn print_stats(stats: &CrawlStats) {
    println!("Pages downloaded: {}", stats.pages_downloaded);
    println!("Items scraped:    {}", stats.items_scraped);
    println!("Items dropped:    {}", stats.items_dropped);
    println!("Robots denied:    {}", stats.robots_denied);
    println!("Robots errors:    {}", stats.robots_errors);
    println!("Download errors:  {}", stats.download_errors);
    println!("Scrape errors:    {}", stats.scrape_errors);
}

pub async fn run(
    crawler_conf: &CrawlerConfig,
    start_urls: &[String],
    output: &Path,
) -> anyhow::Result<()> {
    let mut spider_conf = QuotesConfig::default();
    if !start_urls.is_empty() {
        spider_conf.start_urls = start_urls.to_vec();
    }

    if let Some(dir) = output.parent() {
        fs_err::create_dir_all(dir)?;
    }
    let feed = FeedWriter::new(&FeedConfig::for_path(output))?;
    let pipelines = ItemPipelines::new().with(CleanDataPipeline::PRIORITY, CleanDataPipeline);

    let stats =
        crawl_site::<QuotesSpider>(crawler_conf, &spider_conf, pipelines, Some(feed)).await?;

    print_stats(&stats);
    println!("\n✓ Quotes saved to {}", output.display());
    Ok(())
}
