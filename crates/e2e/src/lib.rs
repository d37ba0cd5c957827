//! ReqRes / MUI E2E Test Framework
//!
//! This crate provides a Rust-controlled E2E testing framework that:
//! - Controls Playwright through generated Node scripts
//! - Parses declarative YAML test specs for the MUI documentation widgets
//! - Runs the UI→API workflow that feeds form input into the user API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── run_spec(spec: TestSpec) -> TestResult               │
//! │    └── PlaywrightHandle::run_steps(steps) -> ScriptRun      │
//! │  UserEntryWorkflow                                          │
//! │    ├── FormDriver::enter(fixture)   (browser | simulated)   │
//! │    └── ApiClient::create_user + ResponseValidator           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags, page_errors                 │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── fill / type / clear / click { selector }       │
//! │          ├── choose { native | trigger + option }           │
//! │          ├── assert { selector, value?, min_count?, ... }   │
//! │          └── assert_sorted { selector, numeric }            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod ordering;
pub mod playwright;
pub mod runner;
pub mod section;
pub mod site;
pub mod spec;
pub mod workflow;

pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use spec::{TestSpec, TestStep};
pub use workflow::{UserEntryWorkflow, WorkflowReport, WorkflowResult};
