//! Records produced by spiders.

use chrono::Local;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Raw(String),
}

impl From<&str> for Price {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    pub title: Option<String>,
    pub price: Option<Price>,
    pub rating: Option<String>,
    pub stock: Option<String>,
    pub url: Option<String>,
    pub scraped_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub text: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub scraped_at: Option<String>,
}

/// Items that [`CleanDataPipeline`](crate::pipeline::CleanDataPipeline) can
/// process.
pub trait CleanableItem {
    fn price_mut(&mut self) -> Option<&mut Option<Price>> {
        None
    }

    fn set_scraped_at(&mut self, timestamp: String);
}

impl CleanableItem for ProductItem {
    fn price_mut(&mut self) -> Option<&mut Option<Price>> {
        Some(&mut self.price)
    }

    fn set_scraped_at(&mut self, timestamp: String) {
        self.scraped_at = Some(timestamp);
    }
}

impl CleanableItem for QuoteItem {
    fn set_scraped_at(&mut self, timestamp: String) {
        self.scraped_at = Some(timestamp);
    }
}

/// Strips `$` and `,` then parses the price, `0.0` when it isn't a number.
pub fn clean_price(raw: &str) -> f64 {
    raw.replace(['$', ','], "").trim().parse().unwrap_or(0.0)
}

/// Local time in ISO 8601 with microseconds and no offset.
pub fn timestamp() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
