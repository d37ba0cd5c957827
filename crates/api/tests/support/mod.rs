//! In-process stand-in for the ReqRes user endpoints

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

/// How the stub answers every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Behave like the real API
    Live,
    /// Answer 403 with a challenge page
    Blocked,
    /// Answer with the given status and an error body
    Status(u16),
    /// Answer with the success status but a wrong payload
    Corrupt,
}

/// One request as the stub saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// `METHOD /path?query`
    pub target: String,
    pub authorization: String,
    pub content_type: String,
    pub user_agent: String,
}

#[derive(Clone)]
struct StubState {
    mode: Mode,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct StubApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubApi {
    pub async fn start(mode: Mode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            mode,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/api/users", post(create_user).get(list_users))
            .route("/api/users/:id", put(update_user).delete(delete_user))
            .route("/health", get(|| async { "ok" }))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn targets(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.target).collect()
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn record(state: &StubState, method: &Method, uri: &Uri, headers: &HeaderMap) {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    state.requests.lock().unwrap().push(Recorded {
        target: format!("{} {}", method, path),
        authorization: header(headers, "authorization"),
        content_type: header(headers, "content-type"),
        user_agent: header(headers, "user-agent"),
    });
}

fn refuse(mode: Mode) -> Option<Response> {
    match mode {
        Mode::Blocked => Some(
            (StatusCode::FORBIDDEN, "<html><title>Just a moment...</title></html>").into_response(),
        ),
        Mode::Status(code) => Some(
            (
                StatusCode::from_u16(code).expect("valid status"),
                Json(json!({"error": "unavailable"})),
            )
                .into_response(),
        ),
        Mode::Live | Mode::Corrupt => None,
    }
}

async fn create_user(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &method, &uri, &headers);
    if let Some(refused) = refuse(state.mode) {
        return refused;
    }
    let job = if state.mode == Mode::Corrupt {
        json!("Tampered")
    } else {
        body["job"].clone()
    };
    (
        StatusCode::CREATED,
        Json(json!({
            "name": body["name"],
            "job": job,
            "id": "101",
            "createdAt": "2025-06-01T08:30:00.125Z",
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn list_users(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    record(&state, &method, &uri, &headers);
    if let Some(refused) = refuse(state.mode) {
        return refused;
    }
    let email = if state.mode == Mode::Corrupt {
        "michael.lawson at reqres.in"
    } else {
        "michael.lawson@reqres.in"
    };
    Json(json!({
        "page": query.page.unwrap_or(1),
        "per_page": 6,
        "total": 12,
        "total_pages": 2,
        "data": [
            {
                "id": 7,
                "email": email,
                "first_name": "Michael",
                "last_name": "Lawson",
                "avatar": "https://reqres.in/img/faces/7-image.jpg"
            },
            {
                "id": 8,
                "email": "lindsay.ferguson@reqres.in",
                "first_name": "Lindsay",
                "last_name": "Ferguson",
                "avatar": "https://reqres.in/img/faces/8-image.jpg"
            }
        ]
    }))
    .into_response()
}

async fn update_user(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&state, &method, &uri, &headers);
    if let Some(refused) = refuse(state.mode) {
        return refused;
    }
    let updated_at = if state.mode == Mode::Corrupt {
        "not-a-date"
    } else {
        "2025-06-01T08:31:00.500Z"
    };
    Json(json!({
        "name": body["name"],
        "job": body["job"],
        "updatedAt": updated_at,
    }))
    .into_response()
}

async fn delete_user(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Response {
    record(&state, &method, &uri, &headers);
    if let Some(refused) = refuse(state.mode) {
        return refused;
    }
    StatusCode::NO_CONTENT.into_response()
}
