//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// How uncaught page errors from the site under test are judged
    #[serde(default)]
    pub page_errors: PageErrorPolicy,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Third-party docs sites throw script errors we do not own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Ignore cross-origin script errors, fail on anything else
    #[default]
    IgnoreCrossOrigin,
    /// Ignore every page error
    IgnoreAll,
}

impl PageErrorPolicy {
    /// Whether a page error message should fail the test
    pub fn is_fatal(&self, message: &str) -> bool {
        match self {
            PageErrorPolicy::IgnoreAll => false,
            PageErrorPolicy::IgnoreCrossOrigin => {
                !(message.contains("Script error") || message.contains("cross origin"))
            }
        }
    }
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (absolute, or relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
        #[serde(default = "default_navigation_timeout")]
        timeout_ms: u64,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        force: bool,
    },

    /// Fill an input field
    Fill {
        selector: String,
        value: String,
        #[serde(default)]
        clear_first: bool,
        #[serde(default)]
        force: bool,
    },

    /// Type text with keyboard simulation
    Type {
        selector: String,
        text: String,
        #[serde(default)]
        delay_ms: Option<u64>,
    },

    /// Clear an input field
    Clear {
        selector: String,
    },

    /// Press a key
    Press {
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to appear
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Scroll an element into view
    ScrollIntoView {
        selector: String,
    },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        min_count: Option<usize>,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },

    /// Hover over an element
    Hover {
        selector: String,
    },

    /// Focus an element
    Focus {
        selector: String,
    },

    /// Select an option from a native `<select>` by value or label
    Select {
        selector: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },

    /// Pick from a dropdown that may be a native `<select>` or a custom listbox
    Choose {
        /// Native select to use when present on the page
        native: String,
        /// Option label on the native select
        label: String,
        /// Value the native select must hold afterwards
        #[serde(default)]
        expected_value: Option<String>,
        /// Element opening the custom listbox
        trigger: String,
        /// Regex matched against custom option text
        option: String,
    },

    /// Assert the text of matching elements is in ascending order
    AssertSorted {
        selector: String,
        #[serde(default)]
        numeric: bool,
    },

    /// Assert a fixed list of numbers is in ascending order; needs no page
    AssertOrdered {
        values: Vec<f64>,
    },

    /// Check a checkbox
    Check {
        selector: String,
    },

    /// Uncheck a checkbox
    Uncheck {
        selector: String,
    },

    /// Execute custom JavaScript
    Evaluate {
        script: String,
        #[serde(default)]
        expected: Option<serde_json::Value>,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

fn default_wait_timeout() -> u64 {
    10_000
}

fn default_navigation_timeout() -> u64 {
    30_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    pub value: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
}

impl TestStep {
    /// Short label used in logs and step results
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Fill { selector, .. } => format!("fill:{}", selector),
            TestStep::Type { selector, .. } => format!("type:{}", selector),
            TestStep::Clear { selector } => format!("clear:{}", selector),
            TestStep::Press { key, .. } => format!("press:{}", key),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::ScrollIntoView { selector } => format!("scroll:{}", selector),
            TestStep::Assert { selector, .. } => format!("assert:{}", selector),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::Hover { selector } => format!("hover:{}", selector),
            TestStep::Focus { selector } => format!("focus:{}", selector),
            TestStep::Select { selector, .. } => format!("select:{}", selector),
            TestStep::Choose { native, trigger, .. } => format!("choose:{}|{}", native, trigger),
            TestStep::AssertSorted { selector, .. } => format!("assert_sorted:{}", selector),
            TestStep::AssertOrdered { values } => format!("assert_ordered:{} values", values.len()),
            TestStep::Check { selector } => format!("check:{}", selector),
            TestStep::Uncheck { selector } => format!("uncheck:{}", selector),
            TestStep::Evaluate { .. } => "evaluate".to_string(),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }

    /// Steps the harness can execute without a browser page
    pub fn is_local(&self) -> bool {
        matches!(self, TestStep::AssertOrdered { .. } | TestStep::Log { .. })
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, sorted by file path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut specs = Vec::with_capacity(paths.len());
        for path in &paths {
            specs.push(Self::from_file(path)?);
        }
        Ok(specs)
    }

    /// Whether any step has to run inside Playwright
    pub fn needs_browser(&self) -> bool {
        self.steps.iter().any(|step| !step.is_local())
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("spec name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("spec '{}' has no steps", self.name)));
        }
        for step in &self.steps {
            if let TestStep::Choose { option, .. } = step {
                regex::Regex::new(option).map_err(|e| {
                    E2eError::SpecParse(format!("spec '{}': bad option pattern: {}", self.name, e))
                })?;
            }
        }
        Ok(())
    }
}
