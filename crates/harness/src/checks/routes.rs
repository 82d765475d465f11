//! Route existence, page title, and security header checks

use reqwest::Client;
use scraper::Html;
use tracing::debug;

use super::{join_url, selector};
use crate::error::HarnessResult;
use crate::spec::HeaderExpectation;

pub async fn run(
    client: &Client,
    base_url: &str,
    paths: &[String],
    title_page: Option<&str>,
    security_headers: &[HeaderExpectation],
) -> HarnessResult<Vec<String>> {
    let mut failures = Vec::new();

    for path in paths {
        match client.get(join_url(base_url, path)).send().await {
            Ok(resp) => {
                let status = resp.status();
                debug!("{} answered {}", path, status);
                if !(status.is_success() || status.is_redirection()) {
                    failures.push(format!("{} answered {}", path, status));
                }
            }
            Err(e) => failures.push(format!("{} unreachable: {}", path, e)),
        }
    }

    if let Some(page) = title_page {
        let resp = client.get(join_url(base_url, page)).send().await?;
        let status = resp.status();
        let html = resp.text().await?;
        if !status.is_success() {
            failures.push(format!("{} answered {}", page, status));
        } else if !has_title(&html)? {
            failures.push(format!("{} has no <title>", page));
        }
    }

    if !security_headers.is_empty() {
        let resp = client.get(join_url(base_url, "/")).send().await?;
        let headers = resp.headers();
        for expected in security_headers {
            match headers.get(&expected.name) {
                Some(value) => {
                    let got = value.to_str().unwrap_or_default();
                    if !got.eq_ignore_ascii_case(&expected.value) {
                        failures.push(format!(
                            "header {} is {:?}, expected {:?}",
                            expected.name, got, expected.value
                        ));
                    }
                }
                None => failures.push(format!("header {} is missing", expected.name)),
            }
        }
    }

    Ok(failures)
}

/// The page carries a non-empty `<title>`.
pub fn has_title(html: &str) -> HarnessResult<bool> {
    let doc = Html::parse_document(html);
    let title = selector("title")?;
    Ok(doc
        .select(&title)
        .next()
        .map(|t| !t.text().collect::<String>().trim().is_empty())
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_detection() {
        assert!(has_title("<html><head><title>Accueil</title></head></html>").unwrap());
        assert!(!has_title("<html><head></head><body>no title</body></html>").unwrap());
        assert!(!has_title("<html><head><title>  </title></head></html>").unwrap());
    }
}
