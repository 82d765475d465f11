//! Browser checks driven through Playwright's Node API
//!
//! Each browser check is rendered into a single Node script, executed with
//! `node` from the project root (where Playwright is installed), and judged by
//! the JSON line the script prints last.

use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::spec::{BrowserStep, Viewport};

/// Runs generated Playwright scripts against the live site.
pub struct BrowserDriver {
    base_url: String,
    /// Where `screenshot` steps write their images
    screenshot_dir: PathBuf,
    /// Working directory for `node`, so `require('playwright')` resolves
    workdir: PathBuf,
    headless: bool,
}

/// Terminal JSON line printed by every generated script.
#[derive(Debug, Deserialize)]
struct ScriptOutcome {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    violations: Vec<AuditViolation>,
}

/// One axe-core violation as reported by the audit script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub help: String,
}

impl BrowserDriver {
    pub fn new(
        base_url: &str,
        screenshot_dir: PathBuf,
        workdir: PathBuf,
        headless: bool,
    ) -> HarnessResult<Self> {
        std::fs::create_dir_all(&screenshot_dir)?;
        Ok(Self {
            base_url: base_url.to_string(),
            screenshot_dir,
            workdir,
            headless,
        })
    }

    /// Execute the steps of one browser check. The first failing step aborts
    /// the script and surfaces as a `Browser` error.
    pub async fn run_steps(&self, viewport: Viewport, steps: &[BrowserStep]) -> HarnessResult<()> {
        let script = self.build_script(viewport, steps);
        let outcome = self.run_script(&script).await?;
        if outcome.success {
            Ok(())
        } else {
            Err(HarnessError::Browser(
                outcome.error.unwrap_or_else(|| "script failed".to_string()),
            ))
        }
    }

    /// Load a page, inject axe-core, and collect its violations.
    pub async fn run_audit(
        &self,
        page: &str,
        script_url: &str,
        rule_tags: &[String],
    ) -> HarnessResult<Vec<AuditViolation>> {
        let script = self.build_audit_script(page, script_url, rule_tags);
        let outcome = self.run_script(&script).await?;
        if outcome.success {
            Ok(outcome.violations)
        } else {
            Err(HarnessError::Audit(
                outcome.error.unwrap_or_else(|| "audit failed".to_string()),
            ))
        }
    }

    /// Render the step list into a self-contained Playwright script.
    pub fn build_script(&self, viewport: Viewport, steps: &[BrowserStep]) -> String {
        let mut script = self.script_header(Some(viewport));
        for step in steps {
            script.push_str(&self.step_to_js(step));
            script.push('\n');
        }
        script.push_str(SCRIPT_FOOTER);
        script
    }

    fn build_audit_script(&self, page: &str, script_url: &str, rule_tags: &[String]) -> String {
        let tags = rule_tags
            .iter()
            .map(|t| format!("'{}'", js_str(t)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut script = self.script_header(None);
        script.push_str(&format!(
            "    await page.goto(baseUrl + '{}', {{ waitUntil: 'domcontentloaded' }});\n",
            js_str(page)
        ));
        script.push_str(&format!(
            "    await page.addScriptTag({{ url: '{}' }});\n",
            js_str(script_url)
        ));
        script.push_str(&format!(
            r#"    const results = await page.evaluate(async (tags) => {{
      return await axe.run(document, {{ runOnly: {{ type: 'tag', values: tags }} }});
    }}, [{}]);
    console.log(JSON.stringify({{ success: true, violations: results.violations }}));
"#,
            tags
        ));
        script.push_str(AUDIT_FOOTER);
        script
    }

    fn script_header(&self, viewport: Option<Viewport>) -> String {
        let context = match viewport {
            Some(v) => format!(
                "{{ viewport: {{ width: {}, height: {} }} }}",
                v.width, v.height
            ),
            None => "{}".to_string(),
        };
        format!(
            r#"const {{ chromium }} = require('playwright');

(async () => {{
  const browser = await chromium.launch({{ headless: {headless} }});
  const context = await browser.newContext({context});
  const page = await context.newPage();
  const baseUrl = '{base_url}';
  try {{
"#,
            headless = self.headless,
            context = context,
            base_url = js_str(&self.base_url),
        )
    }

    fn step_to_js(&self, step: &BrowserStep) -> String {
        match step {
            BrowserStep::Navigate { url } => format!(
                "    await page.goto(baseUrl + '{}', {{ waitUntil: 'domcontentloaded' }});",
                js_str(url)
            ),
            BrowserStep::Click {
                selector,
                optional,
                timeout_ms,
            } => {
                if *optional {
                    format!(
                        r#"    {{
      const hit = page.locator('{sel}');
      if (await hit.count()) {{ await hit.first().click(); }}
    }}"#,
                        sel = js_str(selector)
                    )
                } else {
                    format!(
                        "    await page.click('{}', {{ timeout: {} }});",
                        js_str(selector),
                        timeout_ms.unwrap_or(5000)
                    )
                }
            }
            BrowserStep::Fill {
                selector,
                value,
                optional,
            } => {
                if *optional {
                    format!(
                        r#"    {{
      const field = page.locator('{sel}');
      if (await field.count()) {{ await field.first().fill('{value}'); }}
    }}"#,
                        sel = js_str(selector),
                        value = js_str(value)
                    )
                } else {
                    format!(
                        "    await page.fill('{}', '{}');",
                        js_str(selector),
                        js_str(value)
                    )
                }
            }
            BrowserStep::Press { key } => {
                format!("    await page.keyboard.press('{}');", js_str(key))
            }
            BrowserStep::Wait {
                selector,
                timeout_ms,
            } => format!(
                "    await page.waitForSelector('{}', {{ timeout: {} }});",
                js_str(selector),
                timeout_ms
            ),
            BrowserStep::GoBack => {
                "    await page.goBack({ waitUntil: 'domcontentloaded' });".to_string()
            }
            BrowserStep::AssertTitle { pattern } => format!(
                r#"    {{
      const title = await page.title();
      if (!new RegExp('{pat}', 'i').test(title)) {{
        throw new Error('title "' + title + '" does not match /{pat}/');
      }}
    }}"#,
                pat = js_str(pattern)
            ),
            BrowserStep::AssertUrl { pattern } => format!(
                r#"    {{
      const url = page.url();
      if (!new RegExp('{pat}', 'i').test(url)) {{
        throw new Error('url "' + url + '" does not match /{pat}/');
      }}
    }}"#,
                pat = js_str(pattern)
            ),
            BrowserStep::AssertText { selector, pattern } => format!(
                r#"    {{
      const text = await page.locator('{sel}').first().innerText();
      if (!new RegExp('{pat}', 'i').test(text)) {{
        throw new Error('text of {sel} does not match /{pat}/');
      }}
    }}"#,
                sel = js_str(selector),
                pat = js_str(pattern)
            ),
            BrowserStep::AssertVisible { selector } => format!(
                r#"    {{
      const target = page.locator('{sel}').first();
      if (!(await target.isVisible())) {{
        throw new Error('{sel} is not visible');
      }}
    }}"#,
                sel = js_str(selector)
            ),
            BrowserStep::Screenshot { name, full_page } => {
                let path = self.screenshot_dir.join(format!("{}.png", name));
                format!(
                    "    await page.screenshot({{ path: '{}', fullPage: {} }});",
                    js_str(&path.to_string_lossy()),
                    full_page
                )
            }
        }
    }

    /// Write the script to a scratch file, run it with node, and parse the
    /// terminal JSON line.
    async fn run_script(&self, script: &str) -> HarnessResult<ScriptOutcome> {
        let scratch = tempfile::tempdir()?;
        let script_path = scratch.path().join("check.js");
        std::fs::write(&script_path, script)?;

        debug!("running browser script {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => HarnessError::BrowserNotFound,
                _ => HarnessError::Io(e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_outcome(&stdout) {
            Some(outcome) => Ok(outcome),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("Cannot find module 'playwright'") {
                    return Err(HarnessError::BrowserNotFound);
                }
                Err(HarnessError::Browser(format!(
                    "script produced no outcome\nstdout: {}\nstderr: {}",
                    stdout, stderr
                )))
            }
        }
    }
}

const SCRIPT_FOOTER: &str = r#"    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.log(JSON.stringify({ success: false, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#;

const AUDIT_FOOTER: &str = r#"  } catch (error) {
    console.log(JSON.stringify({ success: false, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#;

/// Last stdout line that parses as a script outcome.
fn parse_outcome(stdout: &str) -> Option<ScriptOutcome> {
    stdout
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str(line.trim()).ok())
}

/// Escape a value for embedding in a single-quoted JS string literal.
fn js_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n")
}
