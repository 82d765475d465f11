//! The shipped template set parses with the harness and materializes cleanly

use std::fs;

use sitecheck_harness::{CheckKind, CheckSpec, SiteConfig};
use sitecheck_scaffold::{materialize, TEMPLATES};

fn template(path: &str) -> &'static str {
    TEMPLATES
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("no template at {}", path))
        .content
}

#[test]
fn config_template_parses_with_harness_defaults() {
    let config: SiteConfig = toml::from_str(template("sitecheck.toml")).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.entry_candidates, vec!["run.py", "app.py"]);
    assert_eq!(config.server.runtime_mode, "production");
    assert_eq!(config.readiness.max_attempts, 60);
    assert_eq!(config.readiness.interval_secs, 1);
    assert_eq!(config.teardown.grace_secs, 5);
    assert_eq!(config.visual.threshold, 0.5);
}

#[test]
fn every_yaml_template_parses_as_a_check_spec() {
    let yaml_templates: Vec<_> = TEMPLATES
        .iter()
        .filter(|e| e.path.ends_with(".yaml"))
        .collect();
    assert_eq!(yaml_templates.len(), 8);

    for entry in yaml_templates {
        let spec = CheckSpec::from_yaml(entry.content)
            .unwrap_or_else(|e| panic!("{} does not parse: {}", entry.path, e));
        assert!(!spec.name.is_empty(), "{} has no name", entry.path);
    }
}

#[test]
fn template_kinds_cover_the_whole_check_surface() {
    let specs: Vec<CheckSpec> = TEMPLATES
        .iter()
        .filter(|e| e.path.ends_with(".yaml"))
        .map(|e| CheckSpec::from_yaml(e.content).unwrap())
        .collect();

    assert!(specs
        .iter()
        .any(|s| matches!(s.kind, CheckKind::Routes { .. })));
    assert!(specs
        .iter()
        .any(|s| matches!(s.kind, CheckKind::Semantics { .. })));
    assert!(specs
        .iter()
        .any(|s| matches!(s.kind, CheckKind::StaticAssets { .. })));
    assert!(specs
        .iter()
        .any(|s| matches!(s.kind, CheckKind::Links { .. })));
    assert!(specs
        .iter()
        .any(|s| matches!(s.kind, CheckKind::ContactForm { .. })));
    assert!(specs
        .iter()
        .any(|s| matches!(s.kind, CheckKind::Audit { .. })));

    let browser: Vec<_> = specs
        .iter()
        .filter(|s| matches!(s.kind, CheckKind::Browser { .. }))
        .collect();
    assert_eq!(browser.len(), 2);

    // The main flow carries the visual snapshot.
    let main_flow = browser.iter().find(|s| s.name == "main-flow").unwrap();
    match &main_flow.kind {
        CheckKind::Browser {
            visual_regression, ..
        } => assert!(*visual_regression),
        _ => unreachable!(),
    }
    assert_eq!(main_flow.screenshot_names(), vec!["homepage"]);
}

#[test]
fn full_set_scenario_nine_then_zero_then_nine() {
    let dir = tempfile::tempdir().unwrap();

    // Empty directory: everything is created.
    let first = materialize(dir.path(), TEMPLATES, false).unwrap();
    assert_eq!(first.created.len(), 9);
    assert!(first.skipped.is_empty());
    let expected: Vec<_> = TEMPLATES.iter().map(|e| e.path.to_string()).collect();
    assert_eq!(first.created, expected);

    // Second run: nothing to do.
    let second = materialize(dir.path(), TEMPLATES, false).unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.skipped, expected);

    // Forced run: everything is rewritten.
    let forced = materialize(dir.path(), TEMPLATES, true).unwrap();
    assert_eq!(forced.created, expected);
    assert!(forced.skipped.is_empty());
}

#[test]
fn customized_config_survives_a_rerun() {
    let dir = tempfile::tempdir().unwrap();
    materialize(dir.path(), TEMPLATES, false).unwrap();

    let config_path = dir.path().join("sitecheck.toml");
    fs::write(&config_path, "[server]\nport = 8080\n").unwrap();

    let report = materialize(dir.path(), TEMPLATES, false).unwrap();
    assert!(report.skipped.contains(&"sitecheck.toml".to_string()));
    assert_eq!(
        fs::read_to_string(&config_path).unwrap(),
        "[server]\nport = 8080\n"
    );
}

#[test]
fn materialized_config_round_trips_through_the_harness() {
    let dir = tempfile::tempdir().unwrap();
    materialize(dir.path(), TEMPLATES, false).unwrap();

    let config = SiteConfig::load(&dir.path().join("sitecheck.toml")).unwrap();
    let server = config.server_config(dir.path());
    assert_eq!(server.base_url(), "http://127.0.0.1:5000");
}
