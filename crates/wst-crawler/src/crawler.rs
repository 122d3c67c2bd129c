use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Error, Result};
use futures::{pin_mut, try_join, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use crate::config::{CrawlerConfig, OnError};
use crate::feed::FeedWriter;
use crate::limiter::Throttler;
use crate::pipeline::{ItemPipelines, Processed};
use crate::robots::RobotsCache;
use crate::spider::{CountedTx, OffsiteFilter, Response, Spider};

const DONE_POLL: Duration = Duration::from_millis(250);

/// Counts of what happened during a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_downloaded: usize,
    pub items_scraped: usize,
    pub items_dropped: usize,
    pub robots_denied: usize,
    pub robots_errors: usize,
    pub download_errors: usize,
    pub scrape_errors: usize,
}

#[derive(Debug, Default)]
struct Counters {
    pages_downloaded: AtomicUsize,
    items_scraped: AtomicUsize,
    items_dropped: AtomicUsize,
    robots_denied: AtomicUsize,
    robots_errors: AtomicUsize,
    download_errors: AtomicUsize,
    scrape_errors: AtomicUsize,
}

impl Counters {
    fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            pages_downloaded: self.pages_downloaded.load(Ordering::SeqCst),
            items_scraped: self.items_scraped.load(Ordering::SeqCst),
            items_dropped: self.items_dropped.load(Ordering::SeqCst),
            robots_denied: self.robots_denied.load(Ordering::SeqCst),
            robots_errors: self.robots_errors.load(Ordering::SeqCst),
            download_errors: self.download_errors.load(Ordering::SeqCst),
            scrape_errors: self.scrape_errors.load(Ordering::SeqCst),
        }
    }
}

/// Why a URL couldn't be downloaded, each kind has its own `OnError` policy.
#[derive(Debug)]
enum DownloadError {
    Robots(Error),
    Page(Error),
}

async fn download(
    config: &CrawlerConfig,
    client: &reqwest::Client,
    robots: Option<&RobotsCache>,
    throttler: &Throttler,
    counters: &Counters,
    url: Url,
) -> Result<Option<Response>, DownloadError> {
    let mut crawl_delay = None;
    if let Some(robots) = robots {
        match robots.policy(&url).await {
            Ok(policy) => {
                if !policy.allowed(url.as_str()) {
                    log::info!("Forbidden by robots.txt: {url}");
                    Counters::incr(&counters.robots_denied);
                    return Ok(None);
                }
                crawl_delay = policy.crawl_delay();
            }
            Err(e) => {
                Counters::incr(&counters.robots_errors);
                match config.on_robots_error {
                    OnError::SkipAndLog => log::warn!("{e}, assuming {url} is allowed"),
                    OnError::Fail => return Err(DownloadError::Robots(e)),
                }
            }
        }
    }

    throttler.wait(&url, crawl_delay).await;
    log::debug!("Downloading {url}");

    let resp = match client.get(url.clone()).send().await {
        Ok(resp) => resp,
        Err(e) => {
            Counters::incr(&counters.download_errors);
            return Err(DownloadError::Page(anyhow!(
                "Couldn't download {url} got: {e}"
            )));
        }
    };
    let status = resp.status();
    if !status.is_success() {
        Counters::incr(&counters.download_errors);
        return Err(DownloadError::Page(anyhow!(
            "Couldn't download {url} got: {status}"
        )));
    }

    let url = resp.url().clone();
    let body = resp.text().await.map_err(|e| {
        Counters::incr(&counters.download_errors);
        DownloadError::Page(anyhow!("Couldn't read {url} got: {e}"))
    })?;
    Counters::incr(&counters.pages_downloaded);

    Ok(Some(Response { url, status, body }))
}

/// Crawls from the spider's start URLs until no page is left to visit.
///
/// Pages are downloaded concurrently on the tokio runtime and parsed by
/// `num_workers` threads, each owning its own spider. Items go through
/// `pipelines` then to `feed` when one is given.
pub async fn crawl_site<S>(
    crawler_conf: &CrawlerConfig,
    spider_conf: &S::Config,
    pipelines: ItemPipelines<S::Item>,
    feed: Option<FeedWriter>,
) -> Result<CrawlStats>
where
    S: Spider + 'static,
    S::Item: Serialize,
{
    crawler_conf.validate()?;

    let pages_in = Arc::new(AtomicUsize::new(0));
    let pages_out = Arc::new(AtomicUsize::new(0));
    let counters = Arc::new(Counters::default());

    let (tx_stop, rx_stop) = crossbeam_channel::unbounded::<()>();
    let (tx_url, rx_url) = mpsc::unbounded_channel::<Url>();
    let (tx_page, rx_page) = crossbeam_channel::bounded::<Response>(crawler_conf.page_buffer);
    let (tx_item, rx_item) = crossbeam_channel::unbounded::<S::Item>();

    let tx_url = CountedTx::new(tx_url, pages_in.clone());

    let spider = <S as Spider>::new(spider_conf)?;
    let spider_name = spider.name().to_string();
    let offsite = OffsiteFilter::new(spider.allowed_domains());
    let start_urls = spider.start_urls();
    drop(spider);

    log::info!("Spider {spider_name} opened");

    // Items

    let item_processor = {
        let counters = counters.clone();
        let spider_name = spider_name.clone();
        let mut pipelines = pipelines;
        let mut feed = feed;
        thread::Builder::new()
            .name(String::from("items"))
            .spawn(move || {
                pipelines.open_spider(&spider_name)?;
                for item in rx_item.into_iter() {
                    match pipelines.process(item) {
                        Processed::Kept(item) => {
                            if let Some(feed) = feed.as_mut() {
                                if let Err(e) = feed.write(&item) {
                                    log::error!("Couldn't export item: {e}");
                                }
                            }
                            Counters::incr(&counters.items_scraped);
                        }
                        Processed::Dropped { by } => {
                            log::debug!("Item dropped by {by}");
                            Counters::incr(&counters.items_dropped);
                        }
                        Processed::Failed { by, error } => {
                            log::error!("Item dropped, {by} failed: {error}");
                            Counters::incr(&counters.items_dropped);
                        }
                    }
                }
                pipelines.close_spider(&spider_name)?;
                if let Some(feed) = feed {
                    let written = feed.finish()?;
                    log::info!("Exported {written} items");
                }
                Ok::<(), Error>(())
            })?
    };

    // Workers

    let stop = Arc::new(AtomicBool::new(false));
    let mut workers = vec![];
    for id in 0..crawler_conf.num_workers {
        let rx_stop = rx_stop.clone();
        let rx_page = rx_page.clone();
        let tx_url = tx_url.clone();
        let tx_item = tx_item.clone();
        let pages_out = pages_out.clone();
        let counters = counters.clone();
        let offsite = offsite.clone();
        let spider_conf = spider_conf.clone();
        let on_scrap_error = crawler_conf.on_scrap_error;
        let stop = stop.clone();
        let worker = thread::Builder::new()
            .name(format!("{id}"))
            .spawn(move || {
                let mut spider = <S as Spider>::new(&spider_conf)?;
                loop {
                    crossbeam_channel::select! {
                        recv(rx_page) -> page => {
                            let Ok(response) = page else { break };
                            match spider.parse(&response) {
                                Ok(output) => {
                                    for url in output.requests {
                                        if offsite.allows(&url) {
                                            tx_url.send(url);
                                        } else {
                                            log::debug!("Filtered offsite request to {url}");
                                        }
                                    }
                                    for item in output.items {
                                        tx_item.send(item).ok();
                                    }
                                }
                                Err(e) => match on_scrap_error {
                                    OnError::SkipAndLog => {
                                        log::error!("Skipping scrap for page {} got: {e}", response.url);
                                        Counters::incr(&counters.scrape_errors);
                                    }
                                    OnError::Fail => {
                                        Counters::incr(&counters.scrape_errors);
                                        stop.store(true, Ordering::SeqCst);
                                        return Err(e);
                                    }
                                },
                            }
                            pages_out.fetch_add(1, Ordering::SeqCst);
                        },
                        recv(rx_stop) -> _ => break
                    }
                }
                Ok::<(), Error>(())
            })?;
        workers.push(worker);
    }
    drop(rx_page);
    drop(rx_stop);
    drop(tx_item);

    let workers = async move {
        tokio::task::spawn_blocking(move || {
            for w in workers {
                w.join().map_err(|_| anyhow!("Worker panicked"))??;
            }
            Ok::<(), Error>(())
        })
        .await?
    };

    // Downloader

    let client = reqwest::ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .timeout(crawler_conf.request_timeout())
        .user_agent(&crawler_conf.user_agent)
        .build()?;
    let robots = crawler_conf
        .robots_txt_obey
        .then(|| RobotsCache::new(client.clone(), crawler_conf.user_agent.clone()));
    let throttler = Throttler::new(crawler_conf);

    let downloader = {
        let client = &client;
        let robots = robots.as_ref();
        let throttler = &throttler;
        let counters = &counters;
        let pages_in = &pages_in;
        async move {
            let stream = UnboundedReceiverStream::new(rx_url)
                .map(move |url| async move {
                    let res =
                        download(crawler_conf, client, robots, throttler, counters, url).await;
                    if !matches!(res, Ok(Some(_))) {
                        pages_in.fetch_sub(1, Ordering::SeqCst);
                    }
                    res
                })
                .buffer_unordered(crawler_conf.concurrent_requests);
            pin_mut!(stream);

            while let Some(res) = stream.next().await {
                match res {
                    Ok(Some(page)) => {
                        if tx_page.send(page).is_err() {
                            break;
                        }
                    }
                    Ok(None) => (),
                    // Only returned when `on_robots_error` is `Fail`
                    Err(DownloadError::Robots(e)) => return Err(e),
                    Err(DownloadError::Page(e)) => match crawler_conf.on_dl_error {
                        OnError::SkipAndLog => log::warn!("Skipping URL: {e}"),
                        OnError::Fail => return Err(e),
                    },
                }
            }
            Ok::<(), Error>(())
        }
    };

    // Seed

    for start_url in start_urls {
        match Url::parse(&start_url) {
            Ok(url) => {
                tx_url.send(url);
            }
            Err(e) => log::warn!("Skipping start URL {start_url} got: {e}"),
        }
    }
    drop(tx_url);

    // Run all tasks

    let done = {
        let tx_stop = tx_stop.clone();
        let num_workers = crawler_conf.num_workers;
        let pages_in = &pages_in;
        let pages_out = &pages_out;
        let stop = &stop;
        let stop_workers = move || {
            for _ in 0..num_workers {
                tx_stop.send(()).ok();
            }
        };
        async move {
            loop {
                if crawler_conf.handle_sigint {
                    if timeout(DONE_POLL, tokio::signal::ctrl_c()).await.is_ok() {
                        stop_workers();
                        return Err::<(), _>(anyhow!("Interrupted"));
                    }
                } else {
                    tokio::time::sleep(DONE_POLL).await;
                }
                if stop.load(Ordering::SeqCst)
                    || pages_out.load(Ordering::SeqCst) == pages_in.load(Ordering::SeqCst)
                {
                    stop_workers();
                    return Ok::<_, Error>(());
                }
            }
        }
    };

    let res = try_join!(workers, downloader, done);
    for _ in 0..crawler_conf.num_workers {
        tx_stop.send(()).ok();
    }

    let items = tokio::task::spawn_blocking(move || item_processor.join())
        .await?
        .map_err(|_| anyhow!("Item processor panicked"))?;

    let stats = counters.snapshot();
    log::info!("Spider {spider_name} closed: {stats:?}");

    res?;
    items?;

    Ok(stats)
}
