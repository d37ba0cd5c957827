//! Response validation with mock fallback
//!
//! Every user operation is judged by the same branch:
//!
//! ```text
//! status == success  -> assertions on the live body
//! status triggers    -> assertions on a mock of the same shape
//! fallback
//! anything else      -> log, then pass (lenient) or fail (strict)
//! ```

use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::UnexpectedStatus;
use crate::error::{ApiError, ApiResult};
use crate::mock;
use crate::types::{
    ApiResponse, CreatedUser, Operation, ResponseSource, UpdatedUser, UserFixture, UserPage,
    BLOCKED_STATUS,
};

/// `local@domain.tld` with no whitespace
pub static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// UTC timestamp with optional millisecond fraction
pub static ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3})?Z$").expect("valid timestamp regex")
});

const USER_FIELDS: [&str; 5] = ["id", "email", "first_name", "last_name", "avatar"];

/// Which non-success statuses swap in a mock record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    /// Only 403
    #[default]
    Blocked,
    /// Any status other than the success status
    AnyNonSuccess,
}

/// Result of validating one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// All assertions held on the given record
    Verified { source: ResponseSource },
    /// Status was outside both branches; nothing asserted
    Skipped { status: u16 },
}

impl Verdict {
    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Verdict::Verified { source } => Some(*source),
            Verdict::Skipped { .. } => None,
        }
    }
}

/// A verdict plus the record the assertions ran on, when there was one
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub verdict: Verdict,
    pub record: Option<T>,
}

impl<T> Validated<T> {
    fn verified(source: ResponseSource, record: T) -> Self {
        Self {
            verdict: Verdict::Verified { source },
            record: Some(record),
        }
    }

    fn skipped(status: u16) -> Self {
        Self {
            verdict: Verdict::Skipped { status },
            record: None,
        }
    }
}

enum Branch {
    Live,
    Mock,
    Unexpected,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    fallback: FallbackTrigger,
    unexpected: UnexpectedStatus,
}

impl ResponseValidator {
    pub fn new(unexpected: UnexpectedStatus) -> Self {
        Self {
            fallback: FallbackTrigger::Blocked,
            unexpected,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackTrigger) -> Self {
        self.fallback = fallback;
        self
    }

    fn branch(&self, op: Operation, response: &ApiResponse) -> Branch {
        if response.status == op.success_status() {
            return Branch::Live;
        }
        match self.fallback {
            FallbackTrigger::Blocked if response.status == BLOCKED_STATUS => Branch::Mock,
            FallbackTrigger::AnyNonSuccess => Branch::Mock,
            FallbackTrigger::Blocked => Branch::Unexpected,
        }
    }

    fn skip_or_fail<T>(&self, case: &str, status: u16) -> ApiResult<Validated<T>> {
        match self.unexpected {
            UnexpectedStatus::Lenient => {
                warn!("{}: unexpected status {}, nothing asserted", case, status);
                Ok(Validated::skipped(status))
            }
            UnexpectedStatus::Strict => Err(ApiError::UnexpectedStatus {
                case: case.to_string(),
                status,
            }),
        }
    }

    fn announce_mock(case: &str, status: u16) {
        if status == BLOCKED_STATUS {
            warn!("{}: API blocked the request (403), validating mock response", case);
        } else {
            warn!("{}: API returned {}, validating mock response", case, status);
        }
    }

    /// `POST /users`: expects 201 with the fixture echoed back
    pub fn validate_create(
        &self,
        response: &ApiResponse,
        fixture: &UserFixture,
    ) -> ApiResult<Validated<CreatedUser>> {
        let case = "POST /users";
        let (source, body) = match self.branch(Operation::Create, response) {
            Branch::Live => (ResponseSource::Live, response.body.clone()),
            Branch::Mock => {
                Self::announce_mock(case, response.status);
                let mocked = match self.fallback {
                    FallbackTrigger::Blocked => mock::created_user(fixture),
                    FallbackTrigger::AnyNonSuccess => mock::created_user_unique(fixture),
                };
                (ResponseSource::Mock, serde_json::to_value(mocked)?)
            }
            Branch::Unexpected => return self.skip_or_fail(case, response.status),
        };

        check_created(case, &body, fixture)?;
        let user: CreatedUser = decode(case, body)?;
        info!("{}: validation passed on {} response (id {})", case, source, user.id);
        Ok(Validated::verified(source, user))
    }

    /// `GET /users?page=N`: expects 200 with a non-empty, well-formed user list
    pub fn validate_list(&self, response: &ApiResponse) -> ApiResult<Validated<UserPage>> {
        let case = "GET /users";
        let (source, body) = match self.branch(Operation::Read, response) {
            Branch::Live => (ResponseSource::Live, response.body.clone()),
            Branch::Mock => {
                Self::announce_mock(case, response.status);
                (ResponseSource::Mock, serde_json::to_value(mock::user_page())?)
            }
            Branch::Unexpected => return self.skip_or_fail(case, response.status),
        };

        check_user_list(case, &body)?;
        let page: UserPage = decode(case, body)?;
        info!("{}: {} users validated on {} response", case, page.data.len(), source);
        Ok(Validated::verified(source, page))
    }

    /// `PUT /users/{id}`: expects 200 with the fixture and a valid `updatedAt`
    pub fn validate_update(
        &self,
        response: &ApiResponse,
        fixture: &UserFixture,
    ) -> ApiResult<Validated<UpdatedUser>> {
        let case = "PUT /users";
        let (source, body) = match self.branch(Operation::Update, response) {
            Branch::Live => (ResponseSource::Live, response.body.clone()),
            Branch::Mock => {
                Self::announce_mock(case, response.status);
                (ResponseSource::Mock, serde_json::to_value(mock::updated_user(fixture))?)
            }
            Branch::Unexpected => return self.skip_or_fail(case, response.status),
        };

        check_fixture_echo(case, &body, fixture)?;
        check_timestamp(case, &body, "updatedAt")?;
        let user: UpdatedUser = decode(case, body)?;
        info!("{}: validation passed on {} response", case, source);
        Ok(Validated::verified(source, user))
    }

    /// `DELETE /users/{id}`: expects 204 with an empty body
    pub fn validate_delete(&self, response: &ApiResponse) -> ApiResult<Validated<()>> {
        let case = "DELETE /users";
        let (source, checked) = match self.branch(Operation::Delete, response) {
            Branch::Live => (ResponseSource::Live, response.clone()),
            Branch::Mock => {
                Self::announce_mock(case, response.status);
                (ResponseSource::Mock, mock::deleted())
            }
            Branch::Unexpected => return self.skip_or_fail(case, response.status),
        };

        if checked.status != Operation::Delete.success_status() {
            return Err(ApiError::assertion(
                case,
                format!("expected status 204, got {}", checked.status),
            ));
        }
        if !checked.body_is_empty() {
            return Err(ApiError::assertion(
                case,
                format!("expected empty body, got '{}'", checked.raw_body),
            ));
        }
        info!("{}: validation passed on {} response", case, source);
        Ok(Validated::verified(source, ()))
    }
}

fn decode<T: serde::de::DeserializeOwned>(case: &str, body: Value) -> ApiResult<T> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::assertion(case, format!("body does not decode: {}", e)))
}

fn field<'a>(case: &str, body: &'a Value, name: &str) -> ApiResult<&'a Value> {
    match body.get(name) {
        Some(Value::Null) | None => {
            Err(ApiError::assertion(case, format!("missing property '{}'", name)))
        }
        Some(value) => Ok(value),
    }
}

fn non_empty(case: &str, body: &Value, name: &str) -> ApiResult<()> {
    let value = field(case, body, name)?;
    if value.as_str().is_some_and(str::is_empty) {
        return Err(ApiError::assertion(case, format!("property '{}' is empty", name)));
    }
    Ok(())
}

fn string_field<'a>(case: &str, body: &'a Value, name: &str) -> ApiResult<&'a str> {
    field(case, body, name)?
        .as_str()
        .ok_or_else(|| ApiError::assertion(case, format!("property '{}' is not a string", name)))
}

fn check_fixture_echo(case: &str, body: &Value, fixture: &UserFixture) -> ApiResult<()> {
    let name = string_field(case, body, "name")?;
    if name != fixture.name {
        return Err(ApiError::assertion(
            case,
            format!("name '{}' != fixture '{}'", name, fixture.name),
        ));
    }
    let job = string_field(case, body, "job")?;
    if job != fixture.job {
        return Err(ApiError::assertion(
            case,
            format!("job '{}' != fixture '{}'", job, fixture.job),
        ));
    }
    Ok(())
}

fn check_timestamp(case: &str, body: &Value, name: &str) -> ApiResult<()> {
    let raw = string_field(case, body, name)?;
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| ApiError::assertion(case, format!("'{}' = '{}' is not a date: {}", name, raw, e)))?;
    debug!("{}: {} = {}", case, name, raw);
    Ok(())
}

fn check_created(case: &str, body: &Value, fixture: &UserFixture) -> ApiResult<()> {
    non_empty(case, body, "id")?;
    check_timestamp(case, body, "createdAt")?;
    check_fixture_echo(case, body, fixture)
}

fn check_user_list(case: &str, body: &Value) -> ApiResult<()> {
    let data = field(case, body, "data")?
        .as_array()
        .ok_or_else(|| ApiError::assertion(case, "'data' is not an array"))?;
    if data.is_empty() {
        return Err(ApiError::assertion(case, "'data' is empty"));
    }

    for (index, user) in data.iter().enumerate() {
        let entry = format!("{} data[{}]", case, index);
        for name in USER_FIELDS {
            non_empty(&entry, user, name)?;
        }
        let email = string_field(&entry, user, "email")?;
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ApiError::assertion(&entry, format!("'{}' is not an email", email)));
        }
    }
    Ok(())
}

/// Stricter create checks for the UI→API workflow: string id and
/// `YYYY-MM-DDTHH:MM:SS(.mmm)Z` timestamp
pub fn check_workflow_user(user: &CreatedUser, fixture: &UserFixture) -> ApiResult<()> {
    let case = "workflow";
    if user.name != fixture.name || user.job != fixture.job {
        return Err(ApiError::assertion(
            case,
            format!(
                "response {{name: '{}', job: '{}'}} does not match UI input {{name: '{}', job: '{}'}}",
                user.name, user.job, fixture.name, fixture.job
            ),
        ));
    }
    match &user.id {
        crate::types::UserId::Text(id) if !id.is_empty() => {}
        other => {
            return Err(ApiError::assertion(
                case,
                format!("id must be a non-empty string, got '{}'", other),
            ))
        }
    }
    if !ISO_TIMESTAMP.is_match(&user.created_at) {
        return Err(ApiError::assertion(
            case,
            format!("createdAt '{}' is not an ISO timestamp", user.created_at),
        ));
    }
    DateTime::parse_from_rfc3339(&user.created_at)
        .map_err(|e| ApiError::assertion(case, format!("createdAt is not a date: {}", e)))?;
    Ok(())
}
