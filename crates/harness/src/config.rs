//! Harness configuration loaded from `sitecheck.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::HarnessResult;
use crate::retry::RetryPolicy;
use crate::server::ServerConfig;
use crate::visual::VisualConfig;

/// Top-level harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// How to launch the site under test
    pub server: ServerSection,

    /// Readiness polling
    pub readiness: ReadinessSection,

    /// Teardown behavior
    pub teardown: TeardownSection,

    /// Visual regression directories and threshold
    pub visual: VisualSection,

    /// Check discovery and report output
    pub run: RunSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Interpreter used to launch the entry script
    pub interpreter: String,

    /// Entry scripts to try, in order of preference
    pub entry_candidates: Vec<String>,

    /// Loopback host the server binds
    pub host: String,

    /// Port the server binds
    pub port: u16,

    /// Runtime mode set for the child unless the caller's env already has one
    pub runtime_mode: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            entry_candidates: vec!["run.py".to_string(), "app.py".to_string()],
            host: "127.0.0.1".to_string(),
            port: 5000,
            runtime_mode: "production".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessSection {
    /// Seconds between consecutive probes
    pub interval_secs: u64,

    /// Probes before declaring a boot timeout
    pub max_attempts: u32,

    /// Per-probe HTTP timeout in milliseconds
    pub probe_timeout_ms: u64,
}

impl Default for ReadinessSection {
    fn default() -> Self {
        Self {
            interval_secs: 1,
            max_attempts: 60,
            probe_timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownSection {
    /// Seconds to wait for a clean exit before killing
    pub grace_secs: u64,
}

impl Default for TeardownSection {
    fn default() -> Self {
        Self { grace_secs: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSection {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,

    /// Allowed pixel difference in percent
    pub threshold: f64,
}

impl Default for VisualSection {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("check-results/baselines"),
            actual_dir: PathBuf::from("check-results/screenshots"),
            diff_dir: PathBuf::from("check-results/diffs"),
            threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Directory holding the YAML check specs
    pub checks_dir: PathBuf,

    /// Directory for results.json and screenshots
    pub output_dir: PathBuf,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            checks_dir: PathBuf::from("checks"),
            output_dir: PathBuf::from("check-results"),
        }
    }
}

impl SiteConfig {
    /// Load configuration from file, falling back to defaults when absent.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_secs(self.readiness.interval_secs),
            max_attempts: self.readiness.max_attempts,
            probe_timeout: Duration::from_millis(self.readiness.probe_timeout_ms),
        }
    }

    pub fn server_config(&self, project_root: &Path) -> ServerConfig {
        ServerConfig {
            project_root: project_root.to_path_buf(),
            interpreter: self.server.interpreter.clone(),
            entry_candidates: self
                .server
                .entry_candidates
                .iter()
                .map(PathBuf::from)
                .collect(),
            host: self.server.host.clone(),
            port: self.server.port,
            runtime_mode: self.server.runtime_mode.clone(),
            readiness: self.retry_policy(),
            grace_timeout: Duration::from_secs(self.teardown.grace_secs),
        }
    }

    pub fn visual_config(&self, project_root: &Path, auto_update: bool) -> VisualConfig {
        VisualConfig {
            baseline_dir: resolve(project_root, &self.visual.baseline_dir),
            actual_dir: resolve(project_root, &self.visual.actual_dir),
            diff_dir: resolve(project_root, &self.visual.diff_dir),
            threshold: self.visual.threshold,
            auto_update,
        }
    }
}

/// Interpret a configured path relative to the project root.
pub fn resolve(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_server_contract() {
        let config = SiteConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.entry_candidates, vec!["run.py", "app.py"]);
        assert_eq!(config.readiness.max_attempts, 60);
        assert_eq!(config.teardown.grace_secs, 5);
    }

    #[test]
    fn partial_file_keeps_other_sections_at_defaults() {
        let toml = r#"
[server]
port = 8080

[readiness]
max_attempts = 5
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.interpreter, "python3");
        assert_eq!(config.readiness.max_attempts, 5);
        assert_eq!(config.readiness.interval_secs, 1);
        assert_eq!(config.visual.threshold, 0.5);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load(&dir.path().join("sitecheck.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn relative_paths_resolve_against_project_root() {
        let config = SiteConfig::default();
        let visual = config.visual_config(Path::new("/srv/site"), false);
        assert_eq!(
            visual.baseline_dir,
            PathBuf::from("/srv/site/check-results/baselines")
        );
    }
}
