//! Main test runner that drives UI specs through Playwright

use std::path::PathBuf;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, error, debug};

use crate::error::{E2eError, E2eResult};
use crate::ordering;
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, ScriptRun, StepResult};
use crate::spec::{TestSpec, TestStep};

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub page_errors: Vec<String>,
    pub error: Option<String>,
}

impl TestResult {
    fn errored(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: vec![],
            page_errors: vec![],
            error: Some(error),
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn single(result: TestResult) -> Self {
        Self {
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            skipped: 0,
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    }
}

/// UI test runner
pub struct TestRunner {
    /// Playwright configuration
    playwright_config: PlaywrightConfig,

    /// Test specs directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            playwright_config: config.playwright,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        }
    }

    /// Run all tests in the specs directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_specs(&filtered).await
    }

    /// Run a specific test by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        self.run_spec(&spec).await
    }

    /// Run a list of test specs
    pub async fn run_specs(&self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let skipped = 0;

        if specs.iter().any(TestSpec::needs_browser) {
            PlaywrightHandle::check_playwright_installed(&self.playwright_config.node_binary)?;
        }

        info!("Running {} UI test(s)...", specs.len());

        for spec in specs {
            match self.run_spec(spec).await {
                Ok(result) => {
                    if result.success {
                        passed += 1;
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        failed += 1;
                        error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
                    }
                    results.push(result);
                }
                Err(e) => {
                    failed += 1;
                    error!("✗ {} - {}", spec.name, e);
                    results.push(TestResult::errored(&spec.name, e.to_string()));
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("UI Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms);

        Ok(TestSuiteResult {
            total: specs.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run a single test spec in one browser session, or in-process when no step needs a page
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        if !spec.needs_browser() {
            let run = run_local(&spec.steps);
            return Ok(judge(spec, run, start.elapsed().as_millis() as u64));
        }

        let mut pw_config = self.playwright_config.clone();
        pw_config.viewport_width = spec.viewport.width;
        pw_config.viewport_height = spec.viewport.height;

        let playwright = PlaywrightHandle::from_config(pw_config);
        let run = playwright.run_steps(&spec.steps).await?;

        Ok(judge(spec, run, start.elapsed().as_millis() as u64))
    }

    /// Write test results to JSON file
    pub fn write_results<T: Serialize>(&self, file_name: &str, results: &T) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(file_name);
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute browser-free steps directly, stopping at the first failure
pub fn run_local(steps: &[TestStep]) -> ScriptRun {
    let mut run = ScriptRun::default();
    for step in steps {
        let started = Instant::now();
        let outcome = match step {
            TestStep::AssertOrdered { values } => ordering::check_values_sorted(values),
            TestStep::Log { message } => {
                info!("[TEST LOG] {}", message);
                Ok(())
            }
            other => Err(E2eError::StepFailed {
                step: other.name(),
                reason: "step needs a browser".to_string(),
            }),
        };
        let failed = outcome.is_err();
        run.steps.push(StepResult {
            success: !failed,
            step_name: step.name(),
            duration_ms: started.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
            screenshot_path: None,
            branch: None,
        });
        if failed {
            return run;
        }
    }
    run.completed = true;
    run
}

/// Decide pass/fail for a finished script run
pub fn judge(spec: &TestSpec, run: ScriptRun, duration_ms: u64) -> TestResult {
    let mut test_error = run.first_failure().map(|step| {
        format!(
            "{}: {}",
            step.step_name,
            step.error.as_deref().unwrap_or("step failed")
        )
    });

    for message in &run.page_errors {
        if spec.page_errors.is_fatal(message) {
            test_error.get_or_insert_with(|| format!("uncaught page error: {}", message));
        } else {
            debug!("Ignoring page error in {}: {}", spec.name, message);
        }
    }

    if test_error.is_none() && !run.completed {
        warn!("{}: script ended after {} of {} steps", spec.name, run.steps.len(), spec.steps.len());
        test_error = Some(format!(
            "script ended after {} of {} steps",
            run.steps.len(),
            spec.steps.len()
        ));
    }

    TestResult {
        name: spec.name.clone(),
        success: test_error.is_none(),
        duration_ms,
        steps: run.steps,
        page_errors: run.page_errors,
        error: test_error,
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            specs_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/specs")),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playwright::StepResult;
    use crate::spec::PageErrorPolicy;

    fn spec(policy: PageErrorPolicy) -> TestSpec {
        let mut spec = TestSpec::from_yaml(
            "name: judged\nsteps:\n  - action: click\n    selector: button\n",
        )
        .unwrap();
        spec.page_errors = policy;
        spec
    }

    fn ok_step() -> StepResult {
        StepResult {
            success: true,
            step_name: "click:button".to_string(),
            duration_ms: 5,
            error: None,
            screenshot_path: None,
            branch: None,
        }
    }

    #[test]
    fn test_judge_passes_completed_run() {
        let run = ScriptRun {
            steps: vec![ok_step()],
            page_errors: vec!["Script error.".to_string()],
            completed: true,
        };
        let result = judge(&spec(PageErrorPolicy::IgnoreCrossOrigin), run, 10);
        assert!(result.success, "{:?}", result.error);
    }

    #[test]
    fn test_judge_fails_on_foreign_page_error() {
        let run = ScriptRun {
            steps: vec![ok_step()],
            page_errors: vec!["ReferenceError: foo is not defined".to_string()],
            completed: true,
        };
        let strict = judge(&spec(PageErrorPolicy::IgnoreCrossOrigin), run.clone(), 10);
        assert!(!strict.success);

        let lenient = judge(&spec(PageErrorPolicy::IgnoreAll), run, 10);
        assert!(lenient.success);
    }

    #[test]
    fn test_judge_fails_on_incomplete_run() {
        let run = ScriptRun::default();
        let result = judge(&spec(PageErrorPolicy::IgnoreAll), run, 10);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("0 of 1"));
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TestRunner::with_config(RunnerConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        });
        let path = runner
            .write_results("ui-results.json", &TestSuiteResult::default())
            .unwrap();
        let written: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written.total, 0);
    }

    #[tokio::test]
    async fn test_local_specs_skip_playwright() {
        let mut config = RunnerConfig::default();
        config.playwright.node_binary = "node-binary-that-does-not-exist".to_string();
        let runner = TestRunner::with_config(config);
        let ordered = TestSpec::from_yaml(
            "name: ordered\nsteps:\n  - action: assert_ordered\n    values: [10, 20, 30, 40, 50]\n",
        )
        .unwrap();
        let unordered = TestSpec::from_yaml(
            "name: unordered\nsteps:\n  - action: assert_ordered\n    values: [10, 30, 20]\n  - action: log\n    message: unreachable\n",
        )
        .unwrap();

        let results = runner.run_specs(&[ordered, unordered]).await.unwrap();
        assert_eq!(results.passed, 1);
        assert_eq!(results.failed, 1);
        let failed = &results.results[1];
        assert_eq!(failed.steps.len(), 1);
        assert!(failed.error.as_deref().unwrap().contains("ascending"));
    }

    #[test]
    fn test_run_local_rejects_browser_steps() {
        let run = run_local(&[TestStep::Sleep { ms: 1 }]);
        assert!(!run.completed);
        assert!(run.steps[0].error.as_deref().unwrap().contains("needs a browser"));
    }
}
