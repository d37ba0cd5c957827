//! Playwright browser automation
//!
//! A spec is compiled into one Node script that drives a single page
//! through every step. Each step reports back on stdout as a JSON line
//! prefixed with [`REPORT_PREFIX`], which is how per-step results, page
//! errors and collected values make it back to Rust.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::ordering;
use crate::spec::{AttributeAssertion, TestStep};

/// Marks the report lines the generated script prints
pub const REPORT_PREFIX: &str = "__E2E__";

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser '{}'", other)),
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
    /// Which dropdown flavour a `choose` step found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Everything recovered from one script run
#[derive(Debug, Clone, Default)]
pub struct ScriptRun {
    pub steps: Vec<StepResult>,
    pub page_errors: Vec<String>,
    /// Script reached its last step
    pub completed: bool,
}

impl ScriptRun {
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.success)
    }
}

/// One report line printed by the generated script
#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default)]
    step: Option<i64>,
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    ms: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    values: Option<Vec<String>>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    page_error: Option<String>,
    #[serde(default)]
    done: Option<bool>,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle, failing if Playwright cannot be loaded
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.node_binary)?;
        Ok(Self::from_config(config))
    }

    /// Create a handle without probing for Node/Playwright
    pub fn from_config(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Check if Node can resolve the `playwright` package
    pub fn check_playwright_installed(node: &str) -> E2eResult<()> {
        let status = Command::new(node)
            .args(["-e", "require.resolve('playwright'); require.resolve('@playwright/test')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a set of steps
    pub fn build_script(&self, steps: &[TestStep]) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

const report = (obj) => console.log({prefix} + JSON.stringify(obj));

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  page.on('pageerror', (err) => report({{ page_error: err.message }}));
  const baseUrl = {base_url};
  const resolve = (url) => /^https?:\/\//.test(url) ? url : baseUrl + url;

  let current = -1;
  const step = async (index, body) => {{
    current = index;
    const started = Date.now();
    const extra = await body();
    report(Object.assign({{ step: index, ok: true, ms: Date.now() - started }}, extra || {{}}));
  }};

  try {{
"#,
            prefix = js(REPORT_PREFIX),
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            timeout = self.config.default_timeout_ms,
            base_url = js(&self.config.base_url),
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name().replace('\n', " ")));
            script.push_str(&format!("    await step({}, async () => {{\n", i));
            script.push_str(&self.step_to_js(step));
            script.push_str("\n    });\n");
        }

        script.push_str(
            r#"
    report({ done: true });
  } catch (error) {
    report({ step: current, ok: false, error: error.message });
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Convert a step to the body of its `step(...)` callback
    fn step_to_js(&self, step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url, wait_for_selector, timeout_ms } => {
                let mut js_code = format!(
                    "      await page.goto(resolve({}), {{ timeout: {}, waitUntil: 'domcontentloaded' }});",
                    js(url),
                    timeout_ms
                );
                if let Some(selector) = wait_for_selector {
                    js_code.push_str(&format!(
                        "\n      await page.waitForSelector({}, {{ timeout: {} }});",
                        js(selector),
                        timeout_ms
                    ));
                }
                js_code
            }
            TestStep::Click { selector, timeout_ms, force } => {
                let timeout = timeout_ms.unwrap_or(self.config.default_timeout_ms);
                format!(
                    "      await page.locator({}).first().click({{ timeout: {}, force: {} }});",
                    js(selector),
                    timeout,
                    force
                )
            }
            TestStep::Fill { selector, value, clear_first, force } => {
                let mut lines = vec![
                    format!("      const el = page.locator({}).first();", js(selector)),
                    "      await el.scrollIntoViewIfNeeded();".to_string(),
                ];
                if *clear_first {
                    lines.push(format!("      await el.clear({{ force: {} }});", force));
                }
                lines.push(format!(
                    "      await el.fill({}, {{ force: {} }});",
                    js(value),
                    force
                ));
                lines.join("\n")
            }
            TestStep::Type { selector, text, delay_ms } => {
                let delay = delay_ms.unwrap_or(50);
                format!(
                    "      await page.locator({}).first().pressSequentially({}, {{ delay: {} }});",
                    js(selector),
                    js(text),
                    delay
                )
            }
            TestStep::Clear { selector } => {
                format!(
                    "      await page.locator({}).first().clear({{ force: true }});",
                    js(selector)
                )
            }
            TestStep::Press { selector, key } => match selector {
                Some(sel) => format!(
                    "      await page.locator({}).first().press({});",
                    js(sel),
                    js(key)
                ),
                None => format!("      await page.keyboard.press({});", js(key)),
            },
            TestStep::Wait { selector, timeout_ms, state } => {
                format!(
                    "      await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
                    js(selector),
                    state.as_str(),
                    timeout_ms
                )
            }
            TestStep::Sleep { ms } => {
                format!("      await page.waitForTimeout({});", ms)
            }
            TestStep::ScrollIntoView { selector } => {
                format!(
                    "      await page.locator({}).first().scrollIntoViewIfNeeded();",
                    js(selector)
                )
            }
            TestStep::Assert {
                selector,
                visible,
                text,
                text_contains,
                value,
                attribute,
                count,
                min_count,
            } => assert_to_js(
                selector,
                *visible,
                text.as_deref(),
                text_contains.as_deref(),
                value.as_deref(),
                attribute.as_ref(),
                *count,
                *min_count,
            ),
            TestStep::Screenshot { name, selector, full_page } => {
                let path = self.screenshot_path(name);
                let path_str = path.to_string_lossy();

                match selector {
                    Some(sel) => format!(
                        "      await page.locator({}).first().screenshot({{ path: {} }});",
                        js(sel),
                        js(&path_str)
                    ),
                    None => format!(
                        "      await page.screenshot({{ path: {}, fullPage: {} }});",
                        js(&path_str),
                        full_page
                    ),
                }
            }
            TestStep::Hover { selector } => {
                format!("      await page.locator({}).first().hover();", js(selector))
            }
            TestStep::Focus { selector } => {
                format!("      await page.locator({}).first().focus();", js(selector))
            }
            TestStep::Select { selector, value, label } => {
                let option = match (value, label) {
                    (Some(v), _) => format!("{{ value: {} }}", js(v)),
                    (None, Some(l)) => format!("{{ label: {} }}", js(l)),
                    (None, None) => "{}".to_string(),
                };
                format!(
                    "      await page.locator({}).first().selectOption({}, {{ force: true }});",
                    js(selector),
                    option
                )
            }
            TestStep::Choose { native, label, expected_value, trigger, option } => {
                let expect_value = expected_value
                    .as_ref()
                    .map(|v| format!("\n        await expect(select).toHaveValue({});", js(v)))
                    .unwrap_or_default();
                format!(
                    r#"      if (await page.locator({native}).count() > 0) {{
        const select = page.locator({native}).first();
        await select.scrollIntoViewIfNeeded();
        await select.selectOption({{ label: {label} }}, {{ force: true }});{expect_value}
        return {{ branch: 'native' }};
      }}
      await page.locator({trigger}).first().click({{ force: true }});
      await page.locator('[role="option"]').filter({{ hasText: new RegExp({option}) }}).first().click({{ force: true }});
      return {{ branch: 'custom' }};"#,
                    native = js(native),
                    label = js(label),
                    expect_value = expect_value,
                    trigger = js(trigger),
                    option = js(option),
                )
            }
            TestStep::AssertSorted { selector, .. } => {
                format!(
                    "      await page.locator({sel}).first().waitFor();\n      return {{ values: await page.locator({sel}).allTextContents() }};",
                    sel = js(selector)
                )
            }
            // checked from the report in Rust
            TestStep::AssertOrdered { .. } => String::new(),
            TestStep::Check { selector } => {
                format!("      await page.locator({}).first().check();", js(selector))
            }
            TestStep::Uncheck { selector } => {
                format!("      await page.locator({}).first().uncheck();", js(selector))
            }
            TestStep::Evaluate { script, expected } => {
                let mut js_code = format!(
                    "      const result = await page.evaluate(() => {{ {} }});",
                    script
                );
                if let Some(expected) = expected {
                    js_code.push_str(&format!("\n      expect(result).toEqual({});", expected));
                }
                js_code
            }
            TestStep::Log { message } => {
                format!("      console.log('[TEST] ' + {});", js(message))
            }
        }
    }

    fn screenshot_path(&self, name: &str) -> PathBuf {
        self.config.screenshot_dir.join(format!("{}.png", name))
    }

    /// Run a step list in one browser session
    pub async fn run_steps(&self, steps: &[TestStep]) -> E2eResult<ScriptRun> {
        let script = self.build_script(steps);
        let stdout = self.run_script(&script).await?;
        Ok(self.parse_report(steps, &stdout))
    }

    /// Execute a script with Node and return its stdout
    ///
    /// A non-zero exit is not an error here: failing steps are reported
    /// through the report lines and judged by [`Self::parse_report`].
    pub async fn run_script(&self, script: &str) -> E2eResult<String> {
        std::fs::create_dir_all(&self.config.script_dir)?;
        std::fs::create_dir_all(&self.config.screenshot_dir)?;

        // Inside the project tree so `require('playwright')` resolves node_modules
        let script_file = tempfile::Builder::new()
            .prefix("spec-")
            .suffix(".js")
            .tempfile_in(&self.config.script_dir)?;
        std::fs::write(script_file.path(), script)?;

        debug!("Running Playwright script: {}", script_file.path().display());

        let run = TokioCommand::new(&self.config.node_binary)
            .arg(script_file.path())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.config.script_timeout, run)
            .await
            .map_err(|_| {
                E2eError::Timeout(format!(
                    "Playwright script after {}s",
                    self.config.script_timeout.as_secs()
                ))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() && !stdout.contains(REPORT_PREFIX) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(stdout)
    }

    /// Turn the script's report lines into step results
    pub fn parse_report(&self, steps: &[TestStep], stdout: &str) -> ScriptRun {
        let mut run = ScriptRun::default();
        let mut by_index: HashMap<usize, StepResult> = HashMap::new();

        for line in stdout.lines() {
            let Some(payload) = line.trim().strip_prefix(REPORT_PREFIX) else {
                if !line.trim().is_empty() {
                    debug!("[node] {}", line);
                }
                continue;
            };
            let report: Report = match serde_json::from_str(payload) {
                Ok(report) => report,
                Err(e) => {
                    warn!("Unreadable report line '{}': {}", payload, e);
                    continue;
                }
            };

            if let Some(message) = report.page_error {
                run.page_errors.push(message);
                continue;
            }
            if report.done == Some(true) {
                run.completed = true;
                continue;
            }

            let Some(index) = report.step.and_then(|i| usize::try_from(i).ok()) else {
                if let Some(error) = report.error {
                    warn!("Script failed before the first step: {}", error);
                    run.steps.push(StepResult {
                        success: false,
                        step_name: "setup".to_string(),
                        duration_ms: 0,
                        error: Some(error),
                        screenshot_path: None,
                        branch: None,
                    });
                }
                continue;
            };
            let Some(step) = steps.get(index) else {
                warn!("Report for unknown step {}", index);
                continue;
            };

            let mut result = StepResult {
                success: report.ok.unwrap_or(false),
                step_name: step.name(),
                duration_ms: report.ms.unwrap_or(0),
                error: report.error,
                screenshot_path: None,
                branch: report.branch,
            };

            if result.success {
                match step {
                    TestStep::Screenshot { name, .. } => {
                        result.screenshot_path = Some(self.screenshot_path(name));
                    }
                    TestStep::AssertSorted { numeric, .. } => {
                        let values = report.values.unwrap_or_default();
                        if let Err(e) = ordering::check_column_sorted(&values, *numeric) {
                            result.success = false;
                            result.error = Some(e.to_string());
                        }
                    }
                    TestStep::AssertOrdered { values } => {
                        if let Err(e) = ordering::check_values_sorted(values) {
                            result.success = false;
                            result.error = Some(e.to_string());
                        }
                    }
                    TestStep::Log { message } => info!("[TEST LOG] {}", message),
                    _ => {}
                }
            }

            by_index.insert(index, result);
        }

        let mut indices: Vec<usize> = by_index.keys().copied().collect();
        indices.sort_unstable();
        for index in indices {
            if let Some(result) = by_index.remove(&index) {
                run.steps.push(result);
            }
        }
        run
    }
}

/// Quote a string as a JS literal
fn js(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[allow(clippy::too_many_arguments)]
fn assert_to_js(
    selector: &str,
    visible: Option<bool>,
    text: Option<&str>,
    text_contains: Option<&str>,
    value: Option<&str>,
    attribute: Option<&AttributeAssertion>,
    count: Option<usize>,
    min_count: Option<usize>,
) -> String {
    let loc = format!("page.locator({})", js(selector));
    let mut assertions = Vec::new();

    match visible {
        Some(true) => assertions.push(format!("      await expect({}.first()).toBeVisible();", loc)),
        Some(false) => assertions.push(format!("      await expect({}.first()).toBeHidden();", loc)),
        None => {}
    }

    if let Some(t) = text {
        assertions.push(format!("      await expect({}.first()).toHaveText({});", loc, js(t)));
    }

    if let Some(tc) = text_contains {
        assertions.push(format!("      await expect({}.first()).toContainText({});", loc, js(tc)));
    }

    if let Some(v) = value {
        assertions.push(format!("      await expect({}.first()).toHaveValue({});", loc, js(v)));
    }

    if let Some(attr) = attribute {
        if let Some(val) = &attr.value {
            assertions.push(format!(
                "      await expect({}.first()).toHaveAttribute({}, {});",
                loc,
                js(&attr.name),
                js(val)
            ));
        }
        if let Some(contains) = &attr.contains {
            assertions.push(format!(
                "      expect(await {}.first().getAttribute({})).toContain({});",
                loc,
                js(&attr.name),
                js(contains)
            ));
        }
    }

    if let Some(c) = count {
        assertions.push(format!("      await expect({}).toHaveCount({});", loc, c));
    }

    if let Some(min) = min_count {
        if min > 0 {
            assertions.push(format!("      await {}.first().waitFor();", loc));
        }
        assertions.push(format!(
            "      const found = await {loc}.count();\n      if (found < {min}) throw new Error(`expected at least {min} match(es) for ` + {sel} + `, found ${{found}}`);",
            loc = loc,
            min = min,
            sel = js(selector),
        ));
    }

    assertions.join("\n")
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Prefix for relative navigation URLs
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    /// Where generated scripts are written; must sit under the directory holding node_modules
    pub script_dir: PathBuf,
    pub node_binary: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    /// Playwright default action timeout
    pub default_timeout_ms: u64,
    /// Wall-clock limit for a whole script
    pub script_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mui.com".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            script_dir: PathBuf::from("test-results/scripts"),
            node_binary: "node".to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            default_timeout_ms: 10_000,
            script_timeout: Duration::from_secs(180),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::TestSpec;

    fn handle() -> PlaywrightHandle {
        PlaywrightHandle::from_config(PlaywrightConfig::default())
    }

    #[test]
    fn test_script_escapes_literals() {
        let steps = vec![TestStep::Fill {
            selector: r#"input[type="text"] >> nth=0"#.to_string(),
            value: "O'Brien".to_string(),
            clear_first: true,
            force: true,
        }];
        let script = handle().build_script(&steps);
        assert!(script.contains(r#"page.locator("input[type=\"text\"] >> nth=0").first()"#));
        assert!(script.contains(r#"await el.fill("O'Brien", { force: true });"#));
        assert!(script.contains("await el.clear({ force: true });"));
        assert!(script.contains("await step(0, async () => {"));
    }

    #[test]
    fn test_choose_emits_both_branches() {
        let steps = vec![TestStep::Choose {
            native: "select".to_string(),
            label: "Twenty".to_string(),
            expected_value: Some("20".to_string()),
            trigger: r#"[role="button"]"#.to_string(),
            option: "Twenty|20".to_string(),
        }];
        let script = handle().build_script(&steps);
        assert!(script.contains(r#"selectOption({ label: "Twenty" }"#));
        assert!(script.contains(r#"toHaveValue("20")"#));
        assert!(script.contains(r#"new RegExp("Twenty|20")"#));
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn test_parse_report_success_and_failure() {
        let spec = TestSpec::from_yaml(
            r#"
name: report
steps:
  - action: navigate
    url: /material-ui/react-select/
  - action: choose
    native: select
    label: Twenty
    trigger: div
    option: Twenty
  - action: click
    selector: button
"#,
        )
        .unwrap();
        let stdout = [
            "noise from the page",
            r#"__E2E__{"page_error":"Script error."}"#,
            r#"__E2E__{"step":0,"ok":true,"ms":812}"#,
            r#"__E2E__{"step":1,"ok":true,"ms":95,"branch":"custom"}"#,
            r#"__E2E__{"step":2,"ok":false,"error":"Timeout 10000ms exceeded."}"#,
        ]
        .join("\n");

        let run = handle().parse_report(&spec.steps, &stdout);
        assert_eq!(run.steps.len(), 3);
        assert!(!run.completed);
        assert_eq!(run.page_errors, vec!["Script error.".to_string()]);
        assert_eq!(run.steps[1].branch.as_deref(), Some("custom"));
        let failure = run.first_failure().unwrap();
        assert_eq!(failure.step_name, "click:button");
        assert!(failure.error.as_deref().unwrap().contains("Timeout"));
    }

    #[test]
    fn test_parse_report_checks_sorting() {
        let steps = vec![TestStep::AssertSorted {
            selector: "td".to_string(),
            numeric: true,
        }];
        let sorted = r#"__E2E__{"step":0,"ok":true,"ms":3,"values":["1","2","10"]}"#;
        assert!(handle().parse_report(&steps, sorted).steps[0].success);

        let unsorted = r#"__E2E__{"step":0,"ok":true,"ms":3,"values":["10","2"]}"#;
        let run = handle().parse_report(&steps, unsorted);
        assert!(!run.steps[0].success);
    }

    #[test]
    fn test_parse_report_records_screenshot() {
        let steps = vec![TestStep::Screenshot {
            name: "table".to_string(),
            selector: None,
            full_page: true,
        }];
        let stdout = "__E2E__{\"step\":0,\"ok\":true,\"ms\":40}\n__E2E__{\"done\":true}";
        let run = handle().parse_report(&steps, stdout);
        assert!(run.completed);
        assert_eq!(
            run.steps[0].screenshot_path,
            Some(PathBuf::from("test-results/screenshots/table.png"))
        );
    }
}
