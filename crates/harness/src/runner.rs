//! Check runner: boots the site once, runs every spec against it

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::browser::BrowserDriver;
use crate::checks;
use crate::config::{resolve, SiteConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::server::ServerHandle;
use crate::spec::{CheckKind, CheckSpec};
use crate::visual::VisualTester;

/// Result of one check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,

    /// Assertion failures found by a check that ran to completion
    pub failures: Vec<String>,

    /// Set when the check could not run at all
    pub error: Option<String>,
}

/// Result of the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<CheckResult>,
}

/// Owns the server handle and the shared HTTP client for the whole run.
pub struct CheckRunner {
    site: SiteConfig,
    project_root: PathBuf,
    update_baselines: bool,
    http: reqwest::Client,
    server: Option<ServerHandle>,
}

impl CheckRunner {
    pub fn new(
        site: SiteConfig,
        project_root: PathBuf,
        update_baselines: bool,
    ) -> HarnessResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            site,
            project_root,
            update_baselines,
            http,
            server: None,
        })
    }

    /// Boot the site under test. A boot failure aborts the whole run before
    /// any check executes.
    pub async fn start_server(&mut self) -> HarnessResult<()> {
        if self.server.is_none() {
            let config = self.site.server_config(&self.project_root);
            self.server = Some(ServerHandle::spawn(config).await?);
        }
        Ok(())
    }

    pub fn stop_server(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop();
        }
    }

    /// Load, filter, and run every check, sharing one server and one client.
    pub async fn run(
        &mut self,
        tag: Option<&str>,
        name: Option<&str>,
    ) -> HarnessResult<SuiteResult> {
        let checks_dir = resolve(&self.project_root, &self.site.run.checks_dir);
        let specs = CheckSpec::load_all(&checks_dir)?;
        let specs = filter_specs(specs, tag, name);
        if let Some(name) = name {
            if specs.is_empty() {
                return Err(HarnessError::SpecParse(format!(
                    "check not found: {}",
                    name
                )));
            }
        }

        self.start_server().await?;

        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        info!("running {} check(s)...", specs.len());

        for spec in &specs {
            let result = self.run_spec(spec).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                let reason = result
                    .error
                    .clone()
                    .unwrap_or_else(|| result.failures.join("; "));
                error!("✗ {} - {}", result.name, reason);
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "check results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    async fn run_spec(&mut self, spec: &CheckSpec) -> CheckResult {
        let start = Instant::now();
        let outcome = self.dispatch(spec).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(failures) => CheckResult {
                name: spec.name.clone(),
                success: failures.is_empty(),
                duration_ms,
                failures,
                error: None,
            },
            Err(e) => CheckResult {
                name: spec.name.clone(),
                success: false,
                duration_ms,
                failures: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    async fn dispatch(&mut self, spec: &CheckSpec) -> HarnessResult<Vec<String>> {
        let base_url = self
            .server
            .as_ref()
            .map(|s| s.base_url().to_string())
            .unwrap_or_else(|| self.site.server_config(&self.project_root).base_url());

        match &spec.kind {
            CheckKind::Routes {
                paths,
                title_page,
                security_headers,
            } => {
                checks::routes::run(
                    &self.http,
                    &base_url,
                    paths,
                    title_page.as_deref(),
                    security_headers,
                )
                .await
            }
            CheckKind::Semantics { page } => {
                checks::semantics::run(&self.http, &base_url, page).await
            }
            CheckKind::StaticAssets { page } => {
                checks::static_assets::run(&self.http, &base_url, page, &self.project_root).await
            }
            CheckKind::Links { start_page } => {
                checks::links::run(&self.http, &base_url, start_page).await
            }
            CheckKind::ContactForm {
                path,
                fields,
                invalid_email,
                success_pattern,
                rejection_pattern,
            } => {
                checks::contact_form::run(
                    &self.http,
                    &base_url,
                    path,
                    fields,
                    invalid_email,
                    success_pattern,
                    rejection_pattern,
                )
                .await
            }
            CheckKind::Browser {
                viewport,
                steps,
                visual_regression,
                visual_threshold,
            } => {
                let driver = self.browser_driver(&base_url)?;
                driver.run_steps(*viewport, steps).await?;

                let mut failures = Vec::new();
                if *visual_regression {
                    let tester = VisualTester::new(
                        self.site
                            .visual_config(&self.project_root, self.update_baselines),
                    )?;
                    for shot in spec.screenshot_names() {
                        match tester.compare(&shot, Some(*visual_threshold)) {
                            Ok(diff) if diff.matches => {}
                            Ok(diff) => failures.push(format!(
                                "'{}' differs by {:.2}% (threshold {:.2}%)",
                                shot, diff.diff_percent, visual_threshold
                            )),
                            Err(HarnessError::BaselineNotFound(_)) => {
                                // First run; adopt with --update-baselines.
                                info!(
                                    "no baseline for '{}' yet, run with --update-baselines",
                                    shot
                                );
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
                Ok(failures)
            }
            CheckKind::Audit {
                page,
                script_url,
                rule_tags,
                failing_impacts,
            } => {
                let driver = self.browser_driver(&base_url)?;
                let violations = driver.run_audit(page, script_url, rule_tags).await?;
                Ok(violations
                    .iter()
                    .filter(|v| {
                        v.impact
                            .as_deref()
                            .map(|i| failing_impacts.iter().any(|f| f == i))
                            .unwrap_or(false)
                    })
                    .map(|v| {
                        format!(
                            "{} ({}): {}",
                            v.id,
                            v.impact.as_deref().unwrap_or("unknown"),
                            v.help
                        )
                    })
                    .collect())
            }
        }
    }

    fn browser_driver(&self, base_url: &str) -> HarnessResult<BrowserDriver> {
        BrowserDriver::new(
            base_url,
            resolve(&self.project_root, &self.site.visual.actual_dir),
            self.project_root.clone(),
            true,
        )
    }

    /// Promote every screenshot taken this run to baseline.
    pub fn update_all_baselines(&self) -> HarnessResult<Vec<String>> {
        let tester = VisualTester::new(self.site.visual_config(&self.project_root, true))?;
        tester.update_all_baselines()
    }

    /// Write results.json into the output directory.
    pub fn write_results(&self, suite: &SuiteResult) -> HarnessResult<PathBuf> {
        let output_dir = resolve(&self.project_root, &self.site.run.output_dir);
        std::fs::create_dir_all(&output_dir)?;

        let path = output_dir.join("results.json");
        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&path, json)?;

        info!("results written to {}", path.display());
        Ok(path)
    }
}

impl Drop for CheckRunner {
    fn drop(&mut self) {
        self.stop_server();
    }
}

/// Keep specs matching the tag and name filters, preserving load order.
pub fn filter_specs(
    specs: Vec<CheckSpec>,
    tag: Option<&str>,
    name: Option<&str>,
) -> Vec<CheckSpec> {
    specs
        .into_iter()
        .filter(|s| tag.map(|t| s.tags.iter().any(|st| st == t)).unwrap_or(true))
        .filter(|s| name.map(|n| s.name == n).unwrap_or(true))
        .collect()
}
