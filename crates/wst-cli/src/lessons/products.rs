use std::path::Path;

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use wst_crawler::{
    CleanDataPipeline, FeedConfig, FeedWriter, ItemPipelines, Price, Processed, ProductItem,
};
use wst_kit::{safe_find, safe_get_text};

lazy_static! {
    static ref PRODUCT: Selector = Selector::parse("div.product").unwrap();
}

fn field(product: ElementRef, css: &str) -> Option<String> {
    let text = safe_get_text(safe_find(product, css), "");
    (!text.is_empty()).then_some(text)
}

/// One raw item per `div.product` of the page.
pub fn parse_products(html: &str) -> Vec<ProductItem> {
    let doc = Html::parse_document(html);
    doc.select(&PRODUCT)
        .map(|product| ProductItem {
            title: field(product, "h3.product-title"),
            price: field(product, ".price").map(Price::Raw),
            rating: field(product, ".rating"),
            stock: field(product, ".stock"),
            url: safe_find(product, "a.details")
                .and_then(|a| a.value().attr("href"))
                .map(String::from),
            scraped_at: None,
        })
        .collect()
}

/// Runs the products through the cleaning pipeline and exports them,
/// returns the kept ones.
pub fn export(products: Vec<ProductItem>, feed: &FeedConfig) -> anyhow::Result<Vec<ProductItem>> {
    let mut pipelines: ItemPipelines<ProductItem> =
        ItemPipelines::new().with(CleanDataPipeline::PRIORITY, CleanDataPipeline);
    let mut writer = FeedWriter::new(feed)?;

    pipelines.open_spider("products")?;
    let mut kept = Vec::new();
    for product in products {
        match pipelines.process(product) {
            Processed::Kept(product) => {
                writer.write(&product)?;
                kept.push(product);
            }
            Processed::Dropped { by } => log::info!("Product dropped by {by}"),
            Processed::Failed { by, error } => log::error!("{by} failed: {error}"),
        }
    }
    pipelines.close_spider("products")?;
    writer.finish()?;

    Ok(kept)
}

pub fn run(file: &Path, output: &Path) -> anyhow::Result<()> {
    let html = fs_err::read_to_string(file)?;
    if let Some(dir) = output.parent() {
        fs_err::create_dir_all(dir)?;
    }

    let products = export(parse_products(&html), &FeedConfig::for_path(output))?;
    println!("Scraped {} products:", products.len());
    for product in &products {
        let price = match &product.price {
            Some(Price::Amount(amount)) => format!("${amount:.2}"),
            Some(Price::Raw(raw)) => raw.clone(),
            None => String::from("N/A"),
        };
        println!(
            "- {}: {price} ({})",
            product.title.as_deref().unwrap_or("N/A"),
            product.stock.as_deref().unwrap_or("N/A")
        );
    }
    println!("\n✓ Products saved to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="product">
            <h3 class="product-title">Laptop
                Pro 15</h3>
            <p class="price">$1,299.99</p>
            <p class="rating">4.5 out of 5</p>
            <p class="stock">In Stock</p>
            <a class="details" href="/products/laptop-pro-15">View details</a>
        </div>
        <div class="product">
            <h3 class="product-title">USB-C Hub</h3>
            <p class="price">Call for price</p>
        </div>"#;

    #[test]
    fn raw_products() {
        let products = parse_products(PAGE);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title.as_deref(), Some("Laptop Pro 15"));
        assert_eq!(products[0].price, Some(Price::Raw(String::from("$1,299.99"))));
        assert_eq!(products[0].url.as_deref(), Some("/products/laptop-pro-15"));
        assert_eq!(products[1].rating, None);
        assert_eq!(products[1].url, None);
    }

    #[test]
    fn cleaned_and_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");

        let products = export(parse_products(PAGE), &FeedConfig::for_path(&path)).unwrap();
        assert_eq!(products[0].price, Some(Price::Amount(1299.99)));
        assert_eq!(products[1].price, Some(Price::Amount(0.0)));
        assert!(products.iter().all(|p| p.scraped_at.is_some()));

        let csv = std::fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("title,price,rating,stock,url,scraped_at")
        );
        assert!(lines
            .next()
            .unwrap()
            .starts_with("Laptop Pro 15,1299.99,4.5 out of 5,In Stock,/products/laptop-pro-15,"));
        assert!(lines.next().unwrap().starts_with("USB-C Hub,0.0,,,,"));
    }
}
