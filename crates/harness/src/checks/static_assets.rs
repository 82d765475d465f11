//! Referenced static assets exist on disk under the project root

use std::path::Path;

use reqwest::Client;
use scraper::Html;

use super::{join_url, selector};
use crate::error::HarnessResult;

pub async fn run(
    client: &Client,
    base_url: &str,
    page: &str,
    project_root: &Path,
) -> HarnessResult<Vec<String>> {
    let resp = client.get(join_url(base_url, page)).send().await?;
    let html = resp.text().await?;

    let mut failures = Vec::new();
    for href in local_asset_refs(&html)? {
        let rel = href.strip_prefix('/').unwrap_or(&href);
        if !project_root.join(rel).exists() {
            failures.push(format!("static file not found on disk: {}", href));
        }
    }
    Ok(failures)
}

/// Stylesheet hrefs and script srcs, with external URLs filtered out.
pub fn local_asset_refs(html: &str) -> HarnessResult<Vec<String>> {
    let doc = Html::parse_document(html);
    let css = selector(r#"link[rel~="stylesheet"]"#)?;
    let js = selector("script[src]")?;

    let mut refs: Vec<String> = doc
        .select(&css)
        .filter_map(|el| el.value().attr("href"))
        .chain(doc.select(&js).filter_map(|el| el.value().attr("src")))
        .filter(|href| !is_external(href))
        .map(str::to_string)
        .collect();
    refs.dedup();
    Ok(refs)
}

fn is_external(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
}
