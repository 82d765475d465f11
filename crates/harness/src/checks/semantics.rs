//! HTML semantic checks: image alt attributes and heading hierarchy

use reqwest::Client;
use scraper::Html;

use super::{join_url, selector};
use crate::error::HarnessResult;

pub async fn run(client: &Client, base_url: &str, page: &str) -> HarnessResult<Vec<String>> {
    let resp = client.get(join_url(base_url, page)).send().await?;
    let html = resp.text().await?;

    let mut failures = Vec::new();
    for src in images_missing_alt(&html)? {
        failures.push(format!("image without alt: {}", src));
    }
    failures.extend(heading_violations(&html)?);
    Ok(failures)
}

/// `src` of every `<img>` that has no `alt` attribute.
pub fn images_missing_alt(html: &str) -> HarnessResult<Vec<String>> {
    let doc = Html::parse_document(html);
    let img = selector("img")?;
    Ok(doc
        .select(&img)
        .filter(|el| el.value().attr("alt").is_none())
        .map(|el| el.value().attr("src").unwrap_or("<no src>").to_string())
        .collect())
}

/// Heading problems: more than one `<h1>`, or a level jumping by more than one.
pub fn heading_violations(html: &str) -> HarnessResult<Vec<String>> {
    let doc = Html::parse_document(html);
    let headings = selector("h1, h2, h3, h4, h5, h6")?;

    let levels: Vec<u32> = doc
        .select(&headings)
        .filter_map(|el| el.value().name().strip_prefix('h')?.parse().ok())
        .collect();

    let mut violations = Vec::new();
    if levels.iter().filter(|&&l| l == 1).count() > 1 {
        violations.push("multiple <h1> found".to_string());
    }

    let mut last = 1;
    for level in levels {
        if level > last + 1 {
            violations.push(format!("heading jumps from h{} to h{}", last, level));
        }
        last = level;
    }
    Ok(violations)
}
