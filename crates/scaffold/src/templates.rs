//! The fixed template set the scaffold writes into a website project
//!
//! One configuration file plus eight YAML check specs. The table is a static
//! constant; the materializer takes it as a parameter so tests can inject
//! smaller tables.

/// A file the scaffold can write: relative path, literal content.
#[derive(Debug, Clone, Copy)]
pub struct TemplateEntry {
    /// Relative path with forward-slash segments
    pub path: &'static str,
    pub content: &'static str,
}

pub static TEMPLATES: &[TemplateEntry] = &[
    TemplateEntry {
        path: "sitecheck.toml",
        content: SITECHECK_TOML,
    },
    TemplateEntry {
        path: "checks/routes.yaml",
        content: ROUTES_YAML,
    },
    TemplateEntry {
        path: "checks/semantics.yaml",
        content: SEMANTICS_YAML,
    },
    TemplateEntry {
        path: "checks/static_assets.yaml",
        content: STATIC_ASSETS_YAML,
    },
    TemplateEntry {
        path: "checks/links.yaml",
        content: LINKS_YAML,
    },
    TemplateEntry {
        path: "checks/contact_form.yaml",
        content: CONTACT_FORM_YAML,
    },
    TemplateEntry {
        path: "checks/e2e/main_flow.yaml",
        content: MAIN_FLOW_YAML,
    },
    TemplateEntry {
        path: "checks/e2e/contact_form.yaml",
        content: CONTACT_FORM_E2E_YAML,
    },
    TemplateEntry {
        path: "checks/a11y/homepage.yaml",
        content: A11Y_HOMEPAGE_YAML,
    },
];

const SITECHECK_TOML: &str = r#"# sitecheck harness configuration

[server]
interpreter = "python3"
entry_candidates = ["run.py", "app.py"]
host = "127.0.0.1"
port = 5000
runtime_mode = "production"

[readiness]
interval_secs = 1
max_attempts = 60
probe_timeout_ms = 1500

[teardown]
grace_secs = 5

[visual]
baseline_dir = "check-results/baselines"
actual_dir = "check-results/screenshots"
diff_dir = "check-results/diffs"
threshold = 0.5

[run]
checks_dir = "checks"
output_dir = "check-results"
"#;

const ROUTES_YAML: &str = r#"name: routes
description: Public routes answer, the homepage has a title and security headers
tags: [http, smoke]
kind: routes
paths:
  - /
  - /index
  - /contact
  - /galerie
  - /partenaires
title_page: /
security_headers:
  - name: X-Content-Type-Options
    value: nosniff
"#;

const SEMANTICS_YAML: &str = r#"name: semantics
description: Images carry alt text and heading levels never skip
tags: [http, html]
kind: semantics
page: /
"#;

const STATIC_ASSETS_YAML: &str = r#"name: static-assets
description: Locally referenced stylesheets and scripts exist on disk
tags: [http, assets]
kind: static_assets
page: /
"#;

const LINKS_YAML: &str = r#"name: internal-links
description: Internal links on the homepage resolve
tags: [http]
kind: links
start_page: /
"#;

const CONTACT_FORM_YAML: &str = r#"name: contact-form
description: Contact form renders, accepts valid input, and rejects a bad email
tags: [http, forms]
kind: contact_form
path: /contact
fields:
  name: Alice
  email: alice@example.com
  message: Bonjour, test automatisé.
invalid_email: not-an-email
success_pattern: merci|thank you|envoyé|message reçu
rejection_pattern: email.*(invalide|invalid)|format
"#;

const MAIN_FLOW_YAML: &str = r#"name: main-flow
description: Main navigation flow plus a full-page snapshot of the homepage
tags: [e2e]
kind: browser
visual_regression: true
visual_threshold: 0.5
steps:
  - action: navigate
    url: /
  - action: assert_title
    pattern: FUSIKAB|DJ
  - action: click
    selector: "a[href*='galerie']"
    optional: true
  - action: assert_url
    pattern: 127\.0\.0\.1:5000
  - action: go_back
  - action: click
    selector: "a[href*='partenaires']"
    optional: true
  - action: go_back
  - action: click
    selector: "a[href*='contact']"
    optional: true
  - action: go_back
  - action: assert_visible
    selector: nav
  - action: screenshot
    name: homepage
    full_page: true
"#;

const CONTACT_FORM_E2E_YAML: &str = r#"name: contact-form-flow
description: Submit the contact form through the browser
tags: [e2e, forms]
kind: browser
steps:
  - action: navigate
    url: /contact
  - action: fill
    selector: "input[name*='name' i], input#name"
    value: Alice
    optional: true
  - action: fill
    selector: "input[type='email'], input[name*='mail' i], input#email"
    value: alice@example.com
    optional: true
  - action: fill
    selector: "textarea[name*='message' i], textarea#message, textarea"
    value: Message envoyé par le navigateur.
    optional: true
  - action: click
    selector: "button[type='submit'], input[type='submit']"
  - action: assert_url
    pattern: contact|merci|thank
  - action: assert_text
    selector: body
    pattern: merci|thank you|reçu
"#;

const A11Y_HOMEPAGE_YAML: &str = r#"name: a11y-homepage
description: axe-core audit of the homepage against WCAG 2.0 A and AA
tags: [e2e, a11y]
kind: audit
page: /
script_url: https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.9.1/axe.min.js
rule_tags: [wcag2a, wcag2aa]
failing_impacts: [serious, critical]
"#;
