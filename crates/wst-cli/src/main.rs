use std::future::Future;
use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use serde::{Deserialize, Serialize};
use tokio::runtime;
use wst_crawler::{CrawlerConfig, OnError, Throttle};
use wst_kit::{logging, settings, Settings};

mod lessons;
mod spiders;

/// Web Scraping Tutorial
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Optional yaml settings file
    #[arg(env = "WST_SETTINGS", long, global = true)]
    pub settings: Option<PathBuf>,
    /// Log filter such as `debug` or `wst_crawler=debug`
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// When quiet no logs are outputted
    #[arg(long, short, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    /// Parse the bundled sample page
    Hello(HelloArgs),
    /// Make a simple GET request
    Request(RequestArgs),
    /// Print the title, headings and paragraphs of a page
    Parse(PageArgs),
    /// Extract and categorize the links of a page
    Links(PageArgs),
    /// CSS selectors over a small product listing
    Selectors,
    /// Extract product titles from the sample products page
    Exercise(ExerciseArgs),
    /// Scrap the sample products page through the item pipeline
    Products(ProductsArgs),
    /// Drive a real browser through WebDriver
    Browser(BrowserArgs),
    /// Scrap pages only where robots.txt allows it
    Robots(RobotsArgs),
    /// Crawl quotes.toscrape.com
    Crawl(CrawlArgs),
    #[command(hide = true)]
    Completion,
}

/// Settings file content, the lessons' settings plus the crawler's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppSettings {
    pub fn load(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(path) => settings::load_yaml(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct HelloArgs {
    /// Html file to inspect, the bundled `sample.html` by default
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct RequestArgs {
    #[arg(default_value = "https://example.com")]
    pub url: String,
}

#[derive(Debug, clap::Args)]
#[command(group = clap::ArgGroup::new("page"))]
pub struct PageArgs {
    /// A distant html page, https://example.com by default
    #[arg(group = "page", long)]
    pub url: Option<String>,
    /// A local html page, used instead of `--url`
    #[arg(group = "page", long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ExerciseArgs {
    /// Products page, the bundled `sample_products.html` by default
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Where titles are saved, `product_titles.txt` in the outputs directory by default
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ProductsArgs {
    /// Products page, the bundled `sample_products.html` by default
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Feed file (.csv, .json or .jsonl), `products.json` in the outputs directory by default
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct BrowserArgs {
    #[arg(default_value = "https://example.com")]
    pub url: String,
    /// Override the WebDriver server url
    #[arg(long)]
    pub webdriver_url: Option<String>,
    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

#[derive(Debug, clap::Args)]
pub struct RobotsArgs {
    #[arg(default_values_t = [String::from("https://example.com/"), String::from("https://example.com/page1")])]
    pub urls: Vec<String>,
    /// Name matched against robots.txt user agents
    #[arg(long, default_value = "MyBot")]
    pub user_agent: String,
}

/// Crawl quotes and export them to a feed
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Feed file (.csv, .json or .jsonl), `quotes.json` in the outputs directory by default
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Override crawler's start urls
    #[arg(long)]
    pub start_url: Vec<String>,
    /// Override crawler's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override crawler's maximum concurrent page downloads
    #[arg(long)]
    pub concurrent_requests: Option<usize>,
    /// Override crawler's delay in seconds between downloads
    #[arg(long)]
    pub download_delay: Option<f32>,
    /// Don't download nor follow robots.txt
    #[arg(long)]
    pub no_robots: bool,
    /// Override crawler's number of CPU workers used to parse pages
    #[arg(long)]
    pub num_workers: Option<usize>,
    /// No SIGINT handling, the feed won't be finalized
    #[arg(long)]
    pub no_sigint: bool,
    /// Override crawler's download error handling strategy
    #[arg(value_enum, long)]
    pub on_dl_error: Option<OnError>,
    /// Override crawler's scrap error handling strategy
    #[arg(value_enum, long)]
    pub on_scrap_error: Option<OnError>,
    /// Override crawler's robots.txt download error handling strategy
    #[arg(value_enum, long)]
    pub on_robots_error: Option<OnError>,
}

impl CrawlArgs {
    /// Applies the command line overrides on top of `conf`.
    pub fn apply(&self, mut conf: CrawlerConfig) -> CrawlerConfig {
        if let Some(user_agent) = &self.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(concurrent_requests) = self.concurrent_requests {
            conf.concurrent_requests = concurrent_requests;
        }
        if let Some(delay) = self.download_delay {
            conf.throttle = Some(Throttle::Delay(delay));
        }
        if self.no_robots {
            conf.robots_txt_obey = false;
        }
        if let Some(num_workers) = self.num_workers {
            conf.num_workers = num_workers;
        }
        if let Some(on_dl_error) = self.on_dl_error {
            conf.on_dl_error = on_dl_error;
        }
        if let Some(on_scrap_error) = self.on_scrap_error {
            conf.on_scrap_error = on_scrap_error;
        }
        if let Some(on_robots_error) = self.on_robots_error {
            conf.on_robots_error = on_robots_error;
        }
        if self.no_sigint {
            conf.handle_sigint = false;
        }
        conf
    }
}

fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    Ok(rt.block_on(fut))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let app = AppSettings::load(args.settings.as_ref())?;

    if !args.quiet {
        logging::init(args.log_level.as_deref().or(app.log_level.as_deref()));
    }

    let paths = &app.settings.paths;
    match args.cmd {
        SubCommand::Hello(hello) => {
            let file = hello
                .file
                .unwrap_or_else(|| paths.sample_pages_dir().join("sample.html"));
            lessons::hello::run(&file)
        }
        SubCommand::Request(req) => block_on(lessons::request::run(&req.url, &app.settings.request))?,
        SubCommand::Parse(page) => {
            let (html, _) = block_on(lessons::load_page(&page, &app.settings.request))??;
            lessons::parse::run(&html);
            Ok(())
        }
        SubCommand::Links(page) => {
            let (html, base) = block_on(lessons::load_page(&page, &app.settings.request))??;
            lessons::links::run(&html, &base);
            Ok(())
        }
        SubCommand::Selectors => lessons::selectors::run(),
        SubCommand::Exercise(exercise) => {
            let file = exercise
                .file
                .unwrap_or_else(|| paths.sample_pages_dir().join("sample_products.html"));
            let output = exercise
                .output
                .unwrap_or_else(|| paths.output_dir().join("product_titles.txt"));
            lessons::exercise::run(&file, &output)
        }
        SubCommand::Products(products) => {
            let file = products
                .file
                .unwrap_or_else(|| paths.sample_pages_dir().join("sample_products.html"));
            let output = products
                .output
                .unwrap_or_else(|| paths.output_dir().join("products.json"));
            lessons::products::run(&file, &output)
        }
        SubCommand::Browser(browser) => {
            let mut settings = app.settings.browser.clone();
            if let Some(webdriver_url) = browser.webdriver_url {
                settings.webdriver_url = webdriver_url;
            }
            if browser.headful {
                settings.headless = false;
            }
            block_on(lessons::browser::run(&settings, &browser.url))?
        }
        SubCommand::Robots(robots) => {
            block_on(lessons::robots::run(&robots.urls, &robots.user_agent))?
        }
        SubCommand::Crawl(crawl) => {
            let crawler_conf = crawl.apply(app.crawler.clone());
            let output = crawl
                .output
                .clone()
                .unwrap_or_else(|| paths.output_dir().join("quotes.json"));
            block_on(lessons::crawl::run(&crawler_conf, &crawl.start_url, &output))?
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "wst", &mut io::stdout());
            Ok(())
        }
    }
}
