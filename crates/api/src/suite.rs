//! The user CRUD suite: create, read, update and delete run in order

use std::future::Future;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::types::{CreatedUser, UpdatedUser, UserFixture, UserPage};
use crate::validator::{ResponseValidator, Validated, Verdict};

/// Page requested by the read case
pub const LIST_PAGE: u32 = 2;

/// User targeted by the update and delete cases
pub const TARGET_USER_ID: u64 = 2;

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub verdict: Option<Verdict>,
    pub created_user_id: Option<String>,
    pub error: Option<String>,
}

/// Result of running all cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<CaseResult>,
}

impl SuiteResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

pub struct ApiSuite {
    client: ApiClient,
    validator: ResponseValidator,
}

impl ApiSuite {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let validator = ResponseValidator::new(config.unexpected_status);
        let client = ApiClient::new(config)?;
        Ok(Self { client, validator })
    }

    pub fn with_validator(client: ApiClient, validator: ResponseValidator) -> Self {
        Self { client, validator }
    }

    /// POST /api/users with the create fixture
    pub async fn create_user(&self) -> ApiResult<Validated<CreatedUser>> {
        let fixture = UserFixture::create();
        let response = self.client.create_user(&fixture).await?;
        let validated = self.validator.validate_create(&response, &fixture)?;
        if let Some(user) = &validated.record {
            info!("User created with ID: {}", user.id);
        }
        Ok(validated)
    }

    /// GET /api/users?page=2
    pub async fn read_users(&self) -> ApiResult<Validated<UserPage>> {
        let response = self.client.list_users(LIST_PAGE).await?;
        self.validator.validate_list(&response)
    }

    /// PUT /api/users/2 with the update fixture
    pub async fn update_user(&self) -> ApiResult<Validated<UpdatedUser>> {
        let fixture = UserFixture::update();
        let response = self.client.update_user(TARGET_USER_ID, &fixture).await?;
        self.validator.validate_update(&response, &fixture)
    }

    /// DELETE /api/users/2
    pub async fn delete_user(&self) -> ApiResult<Validated<()>> {
        let response = self.client.delete_user(TARGET_USER_ID).await?;
        self.validator.validate_delete(&response)
    }

    /// Run all four cases sequentially
    pub async fn run(&self) -> SuiteResult {
        let start = Instant::now();
        info!("Running API suite against {}", self.client.config().base_url);

        let mut results = Vec::with_capacity(4);
        results.push(
            run_case("1. Create User", self.create_user(), |user: &CreatedUser| {
                Some(user.id.to_string())
            })
            .await,
        );
        results.push(run_case("2. Read Users", self.read_users(), |_: &UserPage| None).await);
        results.push(run_case("3. Update User", self.update_user(), |_: &UpdatedUser| None).await);
        results.push(run_case("4. Delete User", self.delete_user(), |_: &()| None).await);

        let passed = results
            .iter()
            .filter(|r| r.success && matches!(r.verdict, Some(Verdict::Verified { .. })))
            .count();
        let skipped = results
            .iter()
            .filter(|r| matches!(r.verdict, Some(Verdict::Skipped { .. })))
            .count();
        let failed = results.iter().filter(|r| !r.success).count();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "API Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        SuiteResult {
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }
}

async fn run_case<T, F>(
    name: &str,
    case: F,
    created_id: impl FnOnce(&T) -> Option<String>,
) -> CaseResult
where
    F: Future<Output = ApiResult<Validated<T>>>,
{
    let start = Instant::now();
    let outcome = case.await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(validated) => {
            info!("✓ {} ({} ms)", name, duration_ms);
            CaseResult {
                name: name.to_string(),
                success: true,
                duration_ms,
                created_user_id: validated.record.as_ref().and_then(created_id),
                verdict: Some(validated.verdict),
                error: None,
            }
        }
        Err(e) => {
            error!("✗ {} - {}", name, e);
            CaseResult {
                name: name.to_string(),
                success: false,
                duration_ms,
                verdict: None,
                created_user_id: None,
                error: Some(e.to_string()),
            }
        }
    }
}
