//! Error types for the check harness

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("no entry script found, tried: {}", format_candidates(.attempted))]
    EntryScriptNotFound { attempted: Vec<PathBuf> },

    #[error("failed to launch server: {0}")]
    ServerSpawn(String),

    #[error("server not ready after {attempts} attempts; captured output:\n{log}")]
    BootTimeout { attempts: u32, log: String },

    #[error("check spec error: {0}")]
    SpecParse(String),

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("playwright not found, install with: npx playwright install")]
    BrowserNotFound,

    #[error("browser step failed: {0}")]
    Browser(String),

    #[error("accessibility audit failed: {0}")]
    Audit(String),

    #[error("visual regression: {0}")]
    VisualRegression(String),

    #[error("baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

fn format_candidates(attempted: &[PathBuf]) -> String {
    attempted
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type HarnessResult<T> = Result<T, HarnessError>;
