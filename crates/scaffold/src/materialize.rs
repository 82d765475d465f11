//! Idempotent materialization of the template set onto disk

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::templates::TemplateEntry;

/// What one invocation did, in template order.
#[derive(Debug, Default, Clone)]
pub struct Materialization {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Write every template under `root`, creating parent directories as needed.
/// Existing files are left untouched unless `force` is set. Write failures
/// propagate as-is; files written before the failure remain on disk.
pub fn materialize(
    root: &Path,
    templates: &[TemplateEntry],
    force: bool,
) -> io::Result<Materialization> {
    let mut report = Materialization::default();

    for entry in templates {
        let target = root.join(entry.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if target.exists() && !force {
            debug!("skipping existing {}", entry.path);
            report.skipped.push(entry.path.to_string());
            continue;
        }

        fs::write(&target, entry.content)?;
        debug!("wrote {}", entry.path);
        report.created.push(entry.path.to_string());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    static SMALL: &[TemplateEntry] = &[
        TemplateEntry {
            path: "config.toml",
            content: "a = 1\n",
        },
        TemplateEntry {
            path: "nested/deep/check.yaml",
            content: "name: x\n",
        },
    ];

    #[test]
    fn first_run_creates_everything_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let report = materialize(dir.path(), SMALL, false).unwrap();

        assert_eq!(report.created, vec!["config.toml", "nested/deep/check.yaml"]);
        assert!(report.skipped.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("nested/deep/check.yaml")).unwrap(),
            "name: x\n"
        );
    }

    #[test]
    fn second_run_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        materialize(dir.path(), SMALL, false).unwrap();
        let report = materialize(dir.path(), SMALL, false).unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.skipped, vec!["config.toml", "nested/deep/check.yaml"]);
    }

    #[test]
    fn existing_edits_survive_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "customized = true\n").unwrap();

        let report = materialize(dir.path(), SMALL, false).unwrap();
        assert_eq!(report.skipped, vec!["config.toml"]);
        assert_eq!(report.created, vec!["nested/deep/check.yaml"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("config.toml")).unwrap(),
            "customized = true\n"
        );
    }

    #[test]
    fn force_overwrites_unconditionally() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "customized = true\n").unwrap();

        let report = materialize(dir.path(), SMALL, true).unwrap();
        assert_eq!(report.created, vec!["config.toml", "nested/deep/check.yaml"]);
        assert!(report.skipped.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("config.toml")).unwrap(),
            "a = 1\n"
        );
    }
}
