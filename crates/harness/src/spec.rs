//! Declarative YAML check specifications

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};

/// A complete check parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Unique name for this check
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering checks
    #[serde(default)]
    pub tags: Vec<String>,

    /// What the check verifies
    #[serde(flatten)]
    pub kind: CheckKind,
}

/// Check behavior, discriminated by the `kind` field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    /// Route existence, page title, security headers
    Routes {
        /// Paths that must answer OK or redirect
        paths: Vec<String>,

        /// Page that must carry a `<title>` (skipped when absent)
        #[serde(default)]
        title_page: Option<String>,

        /// Response headers the homepage must carry
        #[serde(default)]
        security_headers: Vec<HeaderExpectation>,
    },

    /// Image alt attributes and heading hierarchy of one page
    Semantics {
        #[serde(default = "default_page")]
        page: String,
    },

    /// Locally referenced stylesheets and scripts exist on disk
    StaticAssets {
        #[serde(default = "default_page")]
        page: String,
    },

    /// Internal links reachable from the start page resolve
    Links {
        #[serde(default = "default_page")]
        start_page: String,
    },

    /// Contact form GET/POST with CSRF pass-through and validation
    ContactForm {
        path: String,

        /// Valid form data for the happy path
        fields: BTreeMap<String, String>,

        /// Email value the form must reject
        invalid_email: String,

        /// Case-insensitive pattern the success response must match
        success_pattern: String,

        /// Case-insensitive pattern expected in a validation response
        rejection_pattern: String,
    },

    /// Browser-driven flow, optionally with visual regression
    Browser {
        #[serde(default = "default_viewport")]
        viewport: Viewport,

        /// Steps to execute in order
        steps: Vec<BrowserStep>,

        /// Compare screenshots taken by this check against baselines
        #[serde(default)]
        visual_regression: bool,

        /// Allowed pixel difference in percent
        #[serde(default = "default_visual_threshold")]
        visual_threshold: f64,
    },

    /// axe-core accessibility audit of one page
    Audit {
        #[serde(default = "default_page")]
        page: String,

        /// Where to fetch axe-core from
        script_url: String,

        /// Rule tags passed to axe's runOnly
        rule_tags: Vec<String>,

        /// Violation impacts that fail the check
        failing_impacts: Vec<String>,
    },
}

fn default_page() -> String {
    "/".to_string()
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

fn default_visual_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// An expected response header (value compared case-insensitively)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderExpectation {
    pub name: String,
    pub value: String,
}

/// A single step in a browser check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowserStep {
    /// Navigate to a URL (relative to base)
    Navigate { url: String },

    /// Click an element; with `optional`, a missing element is not an error
    Click {
        selector: String,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        selector: String,
        value: String,
        #[serde(default)]
        optional: bool,
    },

    /// Press a key
    Press { key: String },

    /// Wait for an element to appear
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Navigate back in history
    GoBack,

    /// Page title matches a case-insensitive pattern
    AssertTitle { pattern: String },

    /// Current URL matches a case-insensitive pattern
    AssertUrl { pattern: String },

    /// Text of the first matching element matches a pattern
    AssertText { selector: String, pattern: String },

    /// First matching element is visible
    AssertVisible { selector: String },

    /// Take a screenshot into the actual-screenshots directory
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },
}

fn default_wait_timeout() -> u64 {
    5000
}

impl CheckSpec {
    /// Parse a check spec from a YAML string
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(HarnessError::from)
    }

    /// Parse a check spec from a YAML file
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            HarnessError::SpecParse(format!("{}: {}", path.display(), e))
        })
    }

    /// Load all check specs under a directory, in path order.
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut files: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();

        let mut specs = Vec::new();
        for path in files {
            specs.push(Self::from_file(&path)?);
        }
        Ok(specs)
    }

    /// Names of every screenshot this check takes
    pub fn screenshot_names(&self) -> Vec<String> {
        match &self.kind {
            CheckKind::Browser { steps, .. } => steps
                .iter()
                .filter_map(|s| match s {
                    BrowserStep::Screenshot { name, .. } => Some(name.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_routes_spec() {
        let yaml = r#"
name: routes
description: Public routes answer
tags:
  - http
  - smoke
kind: routes
paths:
  - /
  - /contact
title_page: /
security_headers:
  - name: X-Content-Type-Options
    value: nosniff
"#;
        let spec = CheckSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "routes");
        assert_eq!(spec.tags, vec!["http", "smoke"]);
        match spec.kind {
            CheckKind::Routes {
                paths,
                title_page,
                security_headers,
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(title_page.as_deref(), Some("/"));
                assert_eq!(security_headers[0].name, "X-Content-Type-Options");
            }
            other => panic!("expected routes, got {:?}", other),
        }
    }

    #[test]
    fn parse_browser_spec_with_visual_regression() {
        let yaml = r#"
name: main-flow
kind: browser
visual_regression: true
visual_threshold: 1.0
viewport:
  width: 1920
  height: 1080
steps:
  - action: navigate
    url: /
  - action: click
    selector: "a[href*='contact']"
    optional: true
  - action: go_back
  - action: assert_title
    pattern: Home|Accueil
  - action: screenshot
    name: homepage
    full_page: true
"#;
        let spec = CheckSpec::from_yaml(yaml).unwrap();
        match &spec.kind {
            CheckKind::Browser {
                viewport,
                steps,
                visual_regression,
                visual_threshold,
            } => {
                assert_eq!(viewport.width, 1920);
                assert_eq!(steps.len(), 5);
                assert!(visual_regression);
                assert_eq!(*visual_threshold, 1.0);
            }
            other => panic!("expected browser, got {:?}", other),
        }
        assert_eq!(spec.screenshot_names(), vec!["homepage"]);
    }

    #[test]
    fn parse_audit_spec() {
        let yaml = r#"
name: a11y-homepage
kind: audit
page: /
script_url: https://example.com/axe.min.js
rule_tags: [wcag2a, wcag2aa]
failing_impacts: [serious, critical]
"#;
        let spec = CheckSpec::from_yaml(yaml).unwrap();
        match spec.kind {
            CheckKind::Audit {
                rule_tags,
                failing_impacts,
                ..
            } => {
                assert_eq!(rule_tags, vec!["wcag2a", "wcag2aa"]);
                assert_eq!(failing_impacts, vec!["serious", "critical"]);
            }
            other => panic!("expected audit, got {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let yaml = "name: weird\nkind: teapot\n";
        assert!(CheckSpec::from_yaml(yaml).is_err());
    }

    #[test]
    fn load_all_reads_nested_directories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("e2e")).unwrap();
        std::fs::write(
            dir.path().join("routes.yaml"),
            "name: routes\nkind: routes\npaths: [/]\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("e2e/flow.yaml"),
            "name: flow\nkind: browser\nsteps:\n  - action: navigate\n    url: /\n",
        )
        .unwrap();

        let specs = CheckSpec::load_all(dir.path()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "flow");
        assert_eq!(specs[1].name, "routes");
    }
}
