//! ReqRes API Library
//!
//! Client, fixtures and response validation for the ReqRes user API.
//!
//! Every case follows the same three-way branch on the response status:
//! the expected success status validates the live body, 403 (the remote
//! blocking the request) validates a locally synthesised mock of the same
//! shape, and any other status is logged and left unasserted unless the
//! strict policy is configured.

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod suite;
pub mod types;
pub mod validator;

pub use client::ApiClient;
pub use config::{ApiConfig, UnexpectedStatus};
pub use error::{ApiError, ApiResult};
pub use suite::{ApiSuite, CaseResult, SuiteResult};
pub use types::*;
pub use validator::{FallbackTrigger, ResponseValidator, Validated, Verdict};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Public ReqRes API base
pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";
