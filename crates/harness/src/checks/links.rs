//! Internal links reachable from the start page resolve

use reqwest::Client;
use scraper::Html;
use tracing::debug;

use super::{join_url, selector};
use crate::error::HarnessResult;

pub async fn run(client: &Client, base_url: &str, start_page: &str) -> HarnessResult<Vec<String>> {
    let resp = client.get(join_url(base_url, start_page)).send().await?;
    let html = resp.text().await?;

    let mut failures = Vec::new();
    for href in internal_links(&html)? {
        let url = join_url(base_url, &href);
        match client.get(&url).send().await {
            Ok(resp) if resp.status().as_u16() < 400 => {
                debug!("{} -> {}", href, resp.status());
            }
            Ok(resp) => failures.push(format!("{} answered {}", href, resp.status())),
            Err(e) => failures.push(format!("{} failed: {}", href, e)),
        }
    }
    Ok(failures)
}

/// Deduplicated internal hrefs found in anchor tags, in sorted order.
pub fn internal_links(html: &str) -> HarnessResult<Vec<String>> {
    let doc = Html::parse_document(html);
    let anchors = selector("a[href]")?;

    let mut links: Vec<String> = doc
        .select(&anchors)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| is_internal(href))
        .map(str::to_string)
        .collect();
    links.sort();
    links.dedup();
    Ok(links)
}

fn is_internal(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with("http://")
        && !href.starts_with("https://")
        && !href.starts_with("mailto:")
        && !href.starts_with('#')
        && !href.starts_with("tel:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_anchors_and_fragments_are_skipped() {
        let html = r##"
<a href="/contact">Contact</a>
<a href="galerie">Galerie</a>
<a href="https://example.com">Out</a>
<a href="mailto:dj@example.com">Mail</a>
<a href="#top">Top</a>
<a href="tel:+33123456789">Call</a>
<a href="/contact">Contact again</a>
"##;
        assert_eq!(internal_links(html).unwrap(), vec!["/contact", "galerie"]);
    }
}
