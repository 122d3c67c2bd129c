use std::path::Path;

use scraper::{Html, Selector};
use wst_kit::{save_to_file, FileMode};

pub fn product_titles(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(titles) = Selector::parse("h3.product-title") else {
        return Vec::new();
    };
    doc.select(&titles)
        .map(|t| t.text().collect::<String>().trim().to_string())
        .collect()
}

pub fn run(file: &Path, output: &Path) -> anyhow::Result<()> {
    let html = fs_err::read_to_string(file)?;
    let titles = product_titles(&html);

    println!("Product Titles:");
    println!("{}", "-".repeat(40));
    for title in &titles {
        println!("- {title}");
    }

    let data = titles.iter().map(|t| format!("{t}\n")).collect::<String>();
    if let Some(dir) = output.parent() {
        fs_err::create_dir_all(dir)?;
    }
    save_to_file(&data, output, FileMode::Write)?;

    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("\n✓ Titles saved to {name}");
    Ok(())
}
