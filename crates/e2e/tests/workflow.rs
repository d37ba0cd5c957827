//! UI→API workflow against a stub create endpoint

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use test_case::test_case;

use reqres_api::{ApiClient, ApiConfig, ResponseSource, UserFixture};
use reqres_e2e::workflow::{EnteredForm, EntryMode, FormDriver, SimulatedFormDriver, UserEntryWorkflow};
use reqres_e2e::{E2eError, E2eResult};

#[derive(Clone)]
struct Stub {
    status: u16,
    job_override: Option<&'static str>,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn create(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    stub.received.lock().unwrap().push(body.clone());
    let status = StatusCode::from_u16(stub.status).unwrap();
    if stub.status != 201 {
        return (status, "blocked").into_response();
    }
    let job = stub.job_override.map(Value::from).unwrap_or_else(|| body["job"].clone());
    (
        status,
        Json(json!({
            "id": "88",
            "name": body["name"],
            "job": job,
            "createdAt": "2025-06-01T08:30:00.125Z",
        })),
    )
        .into_response()
}

async fn start(status: u16, job_override: Option<&'static str>) -> (ApiClient, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/users", post(create))
        .with_state(Stub {
            status,
            job_override,
            received: received.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ApiClient::new(ApiConfig {
        base_url: format!("http://{}/api", addr),
        ..Default::default()
    })
    .unwrap();
    (client, received)
}

/// Records what it was asked to type
#[derive(Default)]
struct RecordingDriver {
    typed: Mutex<Vec<UserFixture>>,
}

#[async_trait]
impl FormDriver for RecordingDriver {
    async fn enter(&self, fixture: &UserFixture) -> E2eResult<EnteredForm> {
        self.typed.lock().unwrap().push(fixture.clone());
        Ok(EnteredForm {
            mode: EntryMode::Browser,
            values: fixture.clone(),
        })
    }
}

struct BrokenDriver;

#[async_trait]
impl FormDriver for BrokenDriver {
    async fn enter(&self, _fixture: &UserFixture) -> E2eResult<EnteredForm> {
        Err(E2eError::StepFailed {
            step: "fill".to_string(),
            reason: "input not found".to_string(),
        })
    }
}

#[tokio::test]
async fn live_create_uses_real_response() {
    let (client, received) = start(201, None).await;
    let driver = RecordingDriver::default();
    let workflow = UserEntryWorkflow::new(driver, client);

    let report = workflow.run(&UserFixture::create()).await.unwrap();

    assert_eq!(report.entry, EntryMode::Browser);
    assert_eq!(report.source, ResponseSource::Live);
    assert_eq!(report.status, 201);
    assert_eq!(report.user_id, "88");

    let bodies = received.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0], json!({"name": "John Doe", "job": "Software Engineer"}));
}

#[test_case(403 ; "blocked")]
#[test_case(500 ; "server error")]
#[test_case(401 ; "unauthorized")]
#[tokio::test]
async fn non_success_falls_back_to_mock(status: u16) {
    let (client, _) = start(status, None).await;
    let workflow = UserEntryWorkflow::new(SimulatedFormDriver, client);

    let report = workflow.run(&UserFixture::create()).await.unwrap();

    assert_eq!(report.entry, EntryMode::Simulated);
    assert_eq!(report.source, ResponseSource::Mock);
    assert_eq!(report.status, status);
    assert!(!report.user_id.is_empty());
    assert!(report.created_at.ends_with('Z'));
}

#[tokio::test]
async fn live_response_that_drops_input_fails() {
    let (client, _) = start(201, Some("Astronaut")).await;
    let workflow = UserEntryWorkflow::new(SimulatedFormDriver, client);

    let err = workflow.run(&UserFixture::create()).await.unwrap_err();

    assert!(matches!(err, E2eError::Api(_)), "{}", err);
}

#[tokio::test]
async fn ui_failure_stops_before_api_call() {
    let (client, received) = start(201, None).await;
    let workflow = UserEntryWorkflow::new(BrokenDriver, client);

    let err = workflow.run(&UserFixture::create()).await.unwrap_err();

    assert!(matches!(err, E2eError::StepFailed { .. }));
    assert!(received.lock().unwrap().is_empty());
}
