use std::path::Path;

use scraper::{Html, Selector};
use wst_kit::safe_find;

use super::truncate;

/// What the hello lesson finds in the sample page.
#[derive(Debug, Default, PartialEq)]
pub struct SampleReport {
    pub title: Option<String>,
    pub heading: Option<String>,
    pub paragraph_count: usize,
    /// Non-empty paragraphs with their 1-based position
    pub paragraphs: Vec<(usize, String)>,
    /// `li` texts of `div.content`, `None` without such div
    pub content_items: Option<Vec<String>>,
    /// `p` texts of `div.examples`, `None` without such div
    pub libraries: Option<Vec<String>>,
}

fn texts(html: &Html, css: &str) -> Vec<String> {
    match Selector::parse(css) {
        Ok(selector) => html
            .select(&selector)
            .map(|e| e.text().collect())
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub fn inspect(html: &str) -> SampleReport {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let first = |css| safe_find(root, css).map(|e| e.text().collect::<String>());
    let all_paragraphs = texts(&doc, "p");

    SampleReport {
        title: first("title"),
        heading: first("h1"),
        paragraph_count: all_paragraphs.len(),
        paragraphs: all_paragraphs
            .iter()
            .enumerate()
            .map(|(i, p)| (i + 1, p.trim().to_string()))
            .filter(|(_, p)| !p.is_empty())
            .collect(),
        content_items: safe_find(root, "div.content").map(|_| texts(&doc, "div.content li")),
        libraries: safe_find(root, "div.examples").map(|_| texts(&doc, "div.examples p")),
    }
}

pub fn run(file: &Path) -> anyhow::Result<()> {
    println!("{}", "=".repeat(50));
    println!("Hello World - Web Scraping Tutorial");
    println!("{}", "=".repeat(50));
    println!();

    println!("1. Loading sample HTML file...");
    let html = match fs_err::read_to_string(file) {
        Ok(html) => html,
        Err(e) => {
            log::debug!("{e}");
            println!("   ✗ File not found: {}", file.display());
            return Ok(());
        }
    };
    println!("   ✓ Successfully loaded HTML file");
    println!("   Content Length: {} bytes", html.len());
    println!();

    let report = inspect(&html);

    println!("2. Parsing HTML content...");
    if let Some(title) = &report.title {
        println!("   Page Title: {title}");
    }
    if let Some(heading) = &report.heading {
        println!("   First Heading: {heading}");
    }
    println!("   ✓ Parsing successful!");
    println!();

    println!("3. Extracting all paragraphs...");
    println!("   Found {} paragraph(s)", report.paragraph_count);
    for (i, text) in &report.paragraphs {
        println!("   Paragraph {i}: {}", truncate(text, 60));
    }
    println!();

    println!("4. Finding elements by CSS class...");
    if let Some(items) = &report.content_items {
        println!("   ✓ Found content div");
        println!("   List items in content:");
        for item in items {
            println!("     - {item}");
        }
    }
    println!();

    println!("5. Extracting library information...");
    if let Some(libraries) = &report.libraries {
        println!("   Popular libraries mentioned:");
        for lib in libraries {
            println!("     • {lib}");
        }
    }
    println!();

    println!("{}", "=".repeat(50));
    println!("Tutorial complete! Try `wst request` next.");
    println!("{}", "=".repeat(50));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head><title>Web Scraping Tutorial</title></head>
<body>
  <h1>Welcome to Web Scraping!</h1>
  <p>This page is used to practice parsing HTML documents with CSS selectors and friends.</p>
  <p>   </p>
  <p>Short one.</p>
  <div class="content">
    <ul><li>Fetch pages</li><li>Parse HTML</li></ul>
  </div>
  <div class="examples">
    <p>scraper</p>
    <p>reqwest</p>
  </div>
</body>
</html>"#;

    #[test]
    fn sample_report() {
        let report = inspect(PAGE);
        assert_eq!(report.title.as_deref(), Some("Web Scraping Tutorial"));
        assert_eq!(report.heading.as_deref(), Some("Welcome to Web Scraping!"));
        assert_eq!(report.paragraph_count, 5);
        assert_eq!(report.paragraphs[0].0, 1);
        assert_eq!(report.paragraphs[1], (3, String::from("Short one.")));
        assert_eq!(
            report.content_items,
            Some(vec![String::from("Fetch pages"), String::from("Parse HTML")])
        );
        assert_eq!(
            report.libraries,
            Some(vec![String::from("scraper"), String::from("reqwest")])
        );
    }

    #[test]
    fn bare_page() {
        let report = inspect("<p>only</p>");
        assert_eq!(report.title, None);
        assert_eq!(report.content_items, None);
        assert_eq!(report.libraries, None);
        assert_eq!(report.paragraphs, vec![(1, String::from("only"))]);
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(run(Path::new("/definitely/not/here.html")).is_ok());
    }

    #[test]
    fn bundled_sample() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/sample_pages/sample.html");
        let report = inspect(&fs_err::read_to_string(path).unwrap());
        assert!(report.title.is_some());
        assert!(report.content_items.is_some());
        assert!(report.libraries.is_some());
    }
}
