use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};
use wst_crawler::{ParseOutput, QuoteItem, Response, Spider};

lazy_static! {
    static ref QUOTE: Selector = Selector::parse("div.quote").unwrap();
    static ref TEXT: Selector = Selector::parse("span.text").unwrap();
    static ref AUTHOR: Selector = Selector::parse("small.author").unwrap();
    static ref TAG: Selector = Selector::parse("div.tags a.tag").unwrap();
    static ref NEXT_PAGE: Selector = Selector::parse("li.next a").unwrap();
}

#[derive(Debug, Clone)]
pub struct QuotesConfig {
    pub start_urls: Vec<String>,
    pub allowed_domains: Vec<String>,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            start_urls: vec![String::from("http://quotes.toscrape.com/")],
            allowed_domains: vec![String::from("quotes.toscrape.com")],
        }
    }
}

/// Quotes with their author and tags, following the pagination.
pub struct QuotesSpider {
    config: QuotesConfig,
}

fn first_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>())
}

impl Spider for QuotesSpider {
    type Config = QuotesConfig;
    type Item = QuoteItem;

    fn new(config: &Self::Config) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    fn name(&self) -> &str {
        "example"
    }

    fn allowed_domains(&self) -> Vec<String> {
        self.config.allowed_domains.clone()
    }

    fn start_urls(&self) -> Vec<String> {
        self.config.start_urls.clone()
    }

    fn parse(&mut self, response: &Response) -> anyhow::Result<ParseOutput<QuoteItem>> {
        let html = response.html();
        let mut output = ParseOutput::new();

        for quote in html.select(&QUOTE) {
            output.add_item(QuoteItem {
                text: first_text(quote, &TEXT),
                author: first_text(quote, &AUTHOR),
                tags: quote
                    .select(&TAG)
                    .map(|t| t.text().collect())
                    .collect(),
                scraped_at: None,
            });
        }

        let next_page = html
            .select(&NEXT_PAGE)
            .next()
            .and_then(|a| a.value().attr("href"));
        if let Some(next_page) = next_page {
            if !output.follow(response, next_page) {
                log::warn!("Invalid next page link {next_page:?} on {}", response.url);
            }
        }

        Ok(output)
    }
}
