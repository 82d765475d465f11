//! Contact form backend checks: render, valid submit, invalid-email rejection

use std::collections::BTreeMap;

use regex::RegexBuilder;
use reqwest::Client;
use scraper::Html;
use tracing::debug;

use super::{join_url, selector};
use crate::error::HarnessResult;

pub async fn run(
    client: &Client,
    base_url: &str,
    path: &str,
    fields: &BTreeMap<String, String>,
    invalid_email: &str,
    success_pattern: &str,
    rejection_pattern: &str,
) -> HarnessResult<Vec<String>> {
    let success_re = RegexBuilder::new(success_pattern)
        .case_insensitive(true)
        .build()?;
    let rejection_re = RegexBuilder::new(rejection_pattern)
        .case_insensitive(true)
        .build()?;

    let mut failures = Vec::new();
    let url = join_url(base_url, path);

    // GET renders the form (the client follows redirects).
    let resp = client.get(&url).send().await?;
    let status = resp.status();
    let html = resp.text().await?;
    if !status.is_success() {
        failures.push(format!("GET {} answered {}", path, status));
        return Ok(failures);
    }

    let csrf = extract_csrf(&html)?;
    if csrf.is_some() {
        debug!("form carries a CSRF token, echoing it back");
    }

    // Valid submission succeeds and the response confirms it.
    let mut valid = fields.clone();
    if let Some(token) = &csrf {
        valid.insert("csrf_token".to_string(), token.clone());
    }
    let resp = client.post(&url).form(&valid).send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !matches!(status.as_u16(), 200 | 201 | 302) {
        failures.push(format!("valid POST {} answered {}", path, status));
    } else if !success_re.is_match(&text) {
        failures.push(format!(
            "no success confirmation matching /{}/ in contact response",
            success_pattern
        ));
    }

    // Invalid email is rejected, either by status or by a validation message.
    let mut bad = fields.clone();
    bad.insert("email".to_string(), invalid_email.to_string());
    if let Some(token) = &csrf {
        bad.insert("csrf_token".to_string(), token.clone());
    }
    let resp = client.post(&url).form(&bad).send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !matches!(status.as_u16(), 200 | 400 | 422) {
        failures.push(format!("invalid POST {} answered {}", path, status));
    } else if !(matches!(status.as_u16(), 400 | 422) || rejection_re.is_match(&text)) {
        failures.push(format!("invalid email {:?} was not rejected", invalid_email));
    }

    Ok(failures)
}

/// Value of the first hidden input whose name mentions csrf.
pub fn extract_csrf(html: &str) -> HarnessResult<Option<String>> {
    let doc = Html::parse_document(html);
    let inputs = selector("input[name]")?;
    Ok(doc
        .select(&inputs)
        .find(|el| {
            el.value()
                .attr("name")
                .map(|n| n.to_ascii_lowercase().contains("csrf"))
                .unwrap_or(false)
        })
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_token_is_extracted_case_insensitively() {
        let html = r#"
<form method="post">
  <input type="hidden" name="CSRF_token" value="abc123">
  <input type="text" name="name">
</form>
"#;
        assert_eq!(extract_csrf(html).unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn form_without_token_yields_none() {
        let html = r#"<form><input type="text" name="email"></form>"#;
        assert_eq!(extract_csrf(html).unwrap(), None);
    }

    #[test]
    fn token_input_without_value_yields_none() {
        let html = r#"<form><input type="hidden" name="csrf_token"></form>"#;
        assert_eq!(extract_csrf(html).unwrap(), None);
    }
}
