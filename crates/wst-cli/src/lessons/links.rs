use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;
use wst_kit::netloc;

lazy_static! {
    static ref LINKS: Selector = Selector::parse("a[href]").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Every `a[href]` of the page, with its URL made absolute.
pub fn extract_links(html: &str, base: &Url) -> Vec<Link> {
    let doc = Html::parse_document(html);
    doc.select(&LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let text = a.text().collect::<String>().trim().to_string();
            Some(Link {
                text: if text.is_empty() {
                    String::from("[No text]")
                } else {
                    text
                },
                url: base
                    .join(href)
                    .map(String::from)
                    .unwrap_or_else(|_| href.to_string()),
            })
        })
        .collect()
}

#[derive(Debug, Default, PartialEq)]
pub struct Categorized {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

/// Splits links between the base's network location and the others.
/// Links without a host, like `mailto:` ones, are left out.
pub fn categorize(links: &[Link], base: &Url) -> Categorized {
    let base_domain = netloc(base);
    let mut categorized = Categorized::default();
    for link in links {
        let domain = Url::parse(&link.url).ok().as_ref().and_then(netloc);
        match domain {
            Some(domain) if Some(&domain) == base_domain.as_ref() => {
                categorized.internal.push(link.url.clone())
            }
            Some(_) => categorized.external.push(link.url.clone()),
            None => (),
        }
    }
    categorized
}

pub fn run(html: &str, base: &Url) {
    println!("Extracting links from: {base}\n");

    let links = extract_links(html, base);
    println!("Found {} links:\n", links.len());
    for (i, link) in links.iter().enumerate() {
        println!("{}. Text: {}", i + 1, link.text);
        println!("   URL: {}", link.url);
        println!();
    }

    let categorized = categorize(&links, base);
    println!("\nInternal Links ({}):", categorized.internal.len());
    for link in categorized.internal.iter().take(5) {
        println!("  - {link}");
    }
    println!("\nExternal Links ({}):", categorized.external.len());
    for link in categorized.external.iter().take(5) {
        println!("  - {link}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<body>
        <a href="/about">About us</a>
        <a href="contact.html"> </a>
        <a href="https://www.iana.org/domains/example">More information...</a>
        <a href="#top">Top</a>
        <a href="mailto:me@example.com">Mail</a>
        <a href="javascript:void(0)">Nothing</a>
        <a>No href</a>
    </body>"##;

    #[test]
    fn absolute_links() {
        let base = Url::parse("https://example.com/docs/").unwrap();
        let links = extract_links(PAGE, &base);
        assert_eq!(links.len(), 6);
        assert_eq!(links[0].url, "https://example.com/about");
        assert_eq!(links[1].text, "[No text]");
        assert_eq!(links[1].url, "https://example.com/docs/contact.html");
        assert_eq!(links[3].url, "https://example.com/docs/#top");
    }

    #[test]
    fn internal_and_external() {
        let base = Url::parse("https://example.com/docs/").unwrap();
        let categorized = categorize(&extract_links(PAGE, &base), &base);
        assert_eq!(
            categorized.internal,
            vec![
                "https://example.com/about",
                "https://example.com/docs/contact.html",
                "https://example.com/docs/#top",
            ]
        );
        assert_eq!(
            categorized.external,
            vec!["https://www.iana.org/domains/example"]
        );
    }
}
