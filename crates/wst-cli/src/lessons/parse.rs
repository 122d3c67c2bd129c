use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::truncate;

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").unwrap();
    static ref HEADINGS: Selector = Selector::parse("h1, h2, h3").unwrap();
    static ref PARAGRAPHS: Selector = Selector::parse("p").unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Outline {
    pub title: String,
    /// Tag name and text, in document order
    pub headings: Vec<(String, String)>,
    pub paragraphs: Vec<String>,
}

pub fn outline(html: &str) -> Outline {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>())
        .unwrap_or_else(|| String::from("No title found"));
    let headings = doc
        .select(&HEADINGS)
        .map(|h| {
            let text = h.text().collect::<String>();
            (h.value().name().to_string(), text.trim().to_string())
        })
        .collect();
    let paragraphs = doc
        .select(&PARAGRAPHS)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .collect();

    Outline {
        title,
        headings,
        paragraphs,
    }
}

pub fn run(html: &str) {
    let outline = outline(html);
    println!("Page Title: {}", outline.title);

    println!("\nHeadings found:");
    for (name, text) in &outline.headings {
        println!("  {name}: {text}");
    }

    println!("\nParagraphs:");
    for (i, text) in outline.paragraphs.iter().enumerate() {
        println!("  {}. {}", i + 1, truncate(text, 100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_domain() {
        let outline = outline(
            r#"<html><head><title>Example Domain</title></head><body>
            <div><h1>Example Domain</h1>
            <p>This domain is for use in illustrative examples in documents.</p>
            <h3> Details </h3><h2>More</h2>
            <p><a href="https://www.iana.org/domains/example">More information...</a></p>
            </div></body></html>"#,
        );
        assert_eq!(outline.title, "Example Domain");
        assert_eq!(
            outline.headings,
            vec![
                (String::from("h1"), String::from("Example Domain")),
                (String::from("h3"), String::from("Details")),
                (String::from("h2"), String::from("More")),
            ]
        );
        assert_eq!(outline.paragraphs.len(), 2);
        assert_eq!(outline.paragraphs[1], "More information...");
    }

    #[test]
    fn no_title() {
        assert_eq!(outline("<p>hi</p>").title, "No title found");
    }
}
