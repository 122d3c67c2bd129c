mod config;
mod crawler;
mod feed;
mod item;
mod limiter;
mod pipeline;
mod respectful;
mod robots;
mod spider;

pub use config::{CrawlerConfig, OnError, Throttle};
pub use crawler::{crawl_site, CrawlStats};
pub use feed::{CsvTerminator, CsvWriterConfig, FeedConfig, FeedFormat, FeedWriter};
pub use item::{clean_price, timestamp, CleanableItem, Price, ProductItem, QuoteItem};
pub use limiter::{DelayGate, RateLimiter, Throttler};
pub use pipeline::{CleanDataPipeline, ItemPipelines, Pipeline, Processed};
pub use respectful::RespectfulScraper;
pub use robots::{origin, robots_url, RobotsCache, RobotsPolicy};
pub use spider::{CountedTx, OffsiteFilter, ParseOutput, Response, Spider};

pub use anyhow;
