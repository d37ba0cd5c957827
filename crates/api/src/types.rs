//! Fixtures and response records for the user API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input record used to build a request and later verify the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFixture {
    pub name: String,
    pub job: String,
}

impl UserFixture {
    pub fn new(name: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
        }
    }

    /// Fixture for `POST /users` and the UI→API workflow
    pub fn create() -> Self {
        Self::new("John Doe", "Software Engineer")
    }

    /// Fixture for `PUT /users/2`
    pub fn update() -> Self {
        Self::new("Jane Smith Updated", "Senior Developer")
    }
}

/// The four user operations exercised by the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Status the remote returns when the call succeeds
    pub fn success_status(&self) -> u16 {
        match self {
            Operation::Create => 201,
            Operation::Read | Operation::Update => 200,
            Operation::Delete => 204,
        }
    }
}

/// Status code that means the remote refused to serve us
pub const BLOCKED_STATUS: u16 = 403;

/// Status and body of one HTTP exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,

    /// Parsed JSON body; `Null` when the body is empty or not JSON
    pub body: serde_json::Value,

    /// Body exactly as received
    pub raw_body: String,
}

impl ApiResponse {
    pub fn new(status: u16, raw_body: impl Into<String>) -> Self {
        let raw_body = raw_body.into();
        let body = if raw_body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&raw_body).unwrap_or(serde_json::Value::Null)
        };
        Self {
            status,
            body,
            raw_body,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == BLOCKED_STATUS
    }

    /// True when no body was returned (`""`, `{}` or `null`)
    pub fn body_is_empty(&self) -> bool {
        match &self.body {
            serde_json::Value::Null => self.raw_body.trim().is_empty() || self.raw_body.trim() == "null",
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// User ids are strings on create and integers on list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(u64),
    Text(String),
}

impl UserId {
    pub fn is_empty(&self) -> bool {
        matches!(self, UserId::Text(s) if s.is_empty())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// Body of `201 Created` from `POST /users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedUser {
    pub id: UserId,
    pub name: String,
    pub job: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Body of `200 OK` from `PUT /users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedUser {
    pub name: String,
    pub job: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// One entry of a user page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

/// Body of `GET /users?page=N`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub data: Vec<User>,
}

/// Which record the assertions ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Live,
    Mock,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Live => f.write_str("live"),
            ResponseSource::Mock => f.write_str("mock"),
        }
    }
}
