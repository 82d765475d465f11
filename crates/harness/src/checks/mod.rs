//! HTTP-level checks run against the live site
//!
//! Each check takes the shared HTTP client plus the fixture's base URL and
//! returns the list of failures it found. An `Err` means the check could not
//! run at all (the server answered readiness, so most request errors are
//! reported as failures instead).

pub mod contact_form;
pub mod links;
pub mod routes;
pub mod semantics;
pub mod static_assets;

use scraper::Selector;

use crate::error::{HarnessError, HarnessResult};

pub(crate) fn selector(css: &str) -> HarnessResult<Selector> {
    Selector::parse(css).map_err(|e| HarnessError::Selector(e.to_string()))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
