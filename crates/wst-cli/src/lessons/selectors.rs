use anyhow::anyhow;
use scraper::{ElementRef, Html, Selector};

pub const PRODUCTS_HTML: &str = r#"
<html>
<body>
    <div class="container">
        <h1 id="main-title">Products</h1>
        <div class="product featured" data-id="1">
            <h2>Product A</h2>
            <p class="price">$100</p>
        </div>
        <div class="product" data-id="2">
            <h2>Product B</h2>
            <p class="price">$200</p>
        </div>
    </div>
</body>
</html>
"#;

#[derive(Debug)]
pub struct Section {
    pub title: &'static str,
    pub lines: Vec<String>,
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e}"))
}

fn text(element: ElementRef) -> String {
    element.text().collect()
}

fn select_texts(doc: &Html, css: &str) -> anyhow::Result<Vec<String>> {
    Ok(doc.select(&selector(css)?).map(text).collect())
}

/// First `h2` text of the first element matching `css`.
fn product_name(doc: &Html, css: &str) -> anyhow::Result<Option<String>> {
    let h2 = selector("h2")?;
    Ok(doc
        .select(&selector(css)?)
        .next()
        .and_then(|e| e.select(&h2).next())
        .map(text))
}

pub fn demo(html: &str) -> anyhow::Result<Vec<Section>> {
    let doc = Html::parse_document(html);

    let products = doc.select(&selector(".product")?).count();
    let main_title = doc.select(&selector("#main-title")?).next().map(text);
    let featured = product_name(&doc, r#"[data-id="1"]"#)?;
    let all_headings = doc
        .select(&selector("h1, h2")?)
        .map(|h| format!("{}: {}", h.value().name(), text(h)))
        .collect();
    let featured_price = doc
        .select(&selector("div.product.featured p.price")?)
        .next()
        .map(|p| format!("Featured product price: {}", text(p)));

    Ok(vec![
        Section {
            title: "Select by tag",
            lines: select_texts(&doc, "h2")?,
        },
        Section {
            title: "Select by class",
            lines: vec![format!("Found {products} products")],
        },
        Section {
            title: "Select by ID",
            lines: main_title.into_iter().collect(),
        },
        Section {
            title: "Select by attribute",
            lines: featured
                .map(|name| format!("Featured product: {name}"))
                .into_iter()
                .collect(),
        },
        Section {
            title: "Descendant selector (div p)",
            lines: select_texts(&doc, "div.product p.price")?,
        },
        Section {
            title: "Direct child selector (div > h2)",
            lines: select_texts(&doc, "div.product > h2")?,
        },
        Section {
            title: "Multiple selectors (h1, h2)",
            lines: all_headings,
        },
        Section {
            title: "Complex selector",
            lines: featured_price.into_iter().collect(),
        },
    ])
}

pub fn run() -> anyhow::Result<()> {
    println!("CSS Selector Examples");
    println!("{}", "=".repeat(50));
    for (i, section) in demo(PRODUCTS_HTML)?.iter().enumerate() {
        println!("\n{}. {}:", i + 1, section.title);
        for line in &section.lines {
            println!("   {line}");
        }
    }
    Ok(())
}
