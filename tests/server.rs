use std::sync::Arc;
use std::time::Duration;

use action_flow::{PacingConfig, PortalLayout, StepPolicy};
use autofill_cli::{router, ServeState, SimulatedRunner, SupervisorLimits};
use autofill_core_types::{TaskId, TaskStatus};
use autofill_scheduler::{ManagerConfig, TaskManager, TaskSnapshot};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> (Arc<TaskManager>, Router) {
    let runner = SimulatedRunner::new(
        PortalLayout::default(),
        PacingConfig::immediate(),
        StepPolicy::default(),
    );
    let manager = Arc::new(TaskManager::new(
        Arc::new(runner),
        ManagerConfig {
            progress_capacity: 512,
            ..ManagerConfig::default()
        },
    ));
    let limits = SupervisorLimits {
        deadline: Duration::from_secs(60),
        heartbeat: Duration::from_secs(30),
    };
    let app = router(ServeState::new(Arc::clone(&manager), limits));
    (manager, app)
}

fn request_body(id: Option<&str>) -> Value {
    let mut body = json!({
        "credentials": { "username": "clerk", "password": "s3cret-pass" },
        "basic": { "category": "Daily", "urgency": "Normal", "comment": "trip" },
        "payment": {
            "business_dept": "R&D",
            "budget_dept": "R&D",
            "project_type": "Internal",
            "pay_company": "ACME"
        },
        "cost_items": [{
            "category": "Travel",
            "name": "Taxi",
            "comment": "airport",
            "amount": "80",
            "bill_count": "1"
        }],
        "files": ["/tmp/invoice.pdf"]
    });
    if let Some(id) = id {
        body["id"] = json!(id);
    }
    body
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_then_query_task() {
    let (manager, app) = setup();

    let response = app
        .clone()
        .oneshot(post_json("/api/tasks", &request_body(Some("t-1"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["task_id"], "t-1");

    let snapshot = manager
        .wait_for_completion(&TaskId::from("t-1"))
        .await
        .unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);

    let response = app.clone().oneshot(get("/api/tasks/t-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: TaskSnapshot = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(fetched.status, TaskStatus::Completed);
    assert_eq!(fetched.progress, "Reimbursement form filled and saved");

    let response = app.oneshot(get("/api/tasks")).await.unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn generated_id_when_absent() {
    let (_manager, app) = setup();
    let response = app
        .oneshot(post_json("/api/tasks", &request_body(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["task_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn duplicate_id_conflicts() {
    let (_manager, app) = setup();
    let body = request_body(Some("dup"));
    let first = app.clone().oneshot(post_json("/api/tasks", &body)).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post_json("/api/tasks", &body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let error = body_json(second).await;
    assert_eq!(error["success"], false);
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let (_manager, app) = setup();
    for request in [
        get("/api/tasks/missing"),
        get("/api/tasks/missing/stream"),
        post_json("/api/tasks/missing/cancel", &json!({})),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn cancel_after_completion_is_a_no_op() {
    let (manager, app) = setup();
    app.clone()
        .oneshot(post_json("/api/tasks", &request_body(Some("done"))))
        .await
        .unwrap();
    manager
        .wait_for_completion(&TaskId::from("done"))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json("/api/tasks/done/cancel", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["cancelled"], false);
}

#[tokio::test]
async fn stream_relays_progress_and_final_status() {
    let (_manager, app) = setup();
    app.clone()
        .oneshot(post_json("/api/tasks", &request_body(Some("s-1"))))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/tasks/s-1/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("data: - Logged in"));
    assert!(text.contains("data: - Uploading invoice.pdf"));
    assert!(text.contains("data: Reimbursement form filled and saved"));
    assert!(!text.contains("s3cret-pass"));
    let status_at = text.find("event: status").unwrap();
    assert!(text[status_at..].contains("\"completed\""));
}
