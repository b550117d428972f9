//! HTTP surface over the task manager.

use std::convert::Infallible;
use std::sync::Arc;

use async_stream::stream;
use autofill_core_types::{AutofillError, AutomationRequest, TaskId};
use autofill_scheduler::{TaskManager, TaskSnapshot};
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, instrument};

use crate::supervisor::{supervise, LineSink, SinkClosed, SupervisorLimits, SupervisorOutcome};

/// Buffered SSE events per stream.
const STREAM_BUFFER: usize = 32;

#[derive(Clone)]
pub struct ServeState {
    pub manager: Arc<TaskManager>,
    pub limits: SupervisorLimits,
}

impl ServeState {
    pub fn new(manager: Arc<TaskManager>, limits: SupervisorLimits) -> Self {
        Self { manager, limits }
    }
}

pub fn router(state: ServeState) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks_handler).post(create_task_handler))
        .route("/api/tasks/:task_id", get(get_task_handler))
        .route("/api/tasks/:task_id/cancel", post(cancel_task_handler))
        .route("/api/tasks/:task_id/stream", get(task_stream_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("task {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Task(#[from] AutofillError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Task(AutofillError::DuplicateTask(_)) => StatusCode::CONFLICT,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CreateTaskBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    request: AutomationRequest,
}

#[derive(Debug, Serialize)]
struct CreateTaskResponse {
    success: bool,
    task_id: TaskId,
}

#[instrument(name = "autofill.tasks.create", skip_all)]
async fn create_task_handler(
    State(state): State<ServeState>,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let task_id = body
        .id
        .filter(|id| !id.trim().is_empty())
        .map(TaskId::from)
        .unwrap_or_default();
    state.manager.start_task(task_id.clone(), body.request)?;
    info!(task_id = %task_id, "task accepted");
    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            success: true,
            task_id,
        }),
    ))
}

async fn list_tasks_handler(State(state): State<ServeState>) -> Json<Vec<TaskSnapshot>> {
    Json(state.manager.list_tasks())
}

async fn get_task_handler(
    State(state): State<ServeState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskSnapshot>, ApiError> {
    state
        .manager
        .status(&TaskId::from(task_id.as_str()))
        .map(Json)
        .ok_or(ApiError::NotFound(task_id))
}

#[instrument(name = "autofill.tasks.cancel", skip(state))]
async fn cancel_task_handler(
    State(state): State<ServeState>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = TaskId::from(task_id.as_str());
    if state.manager.status(&id).is_none() {
        return Err(ApiError::NotFound(task_id));
    }
    let cancelled = state.manager.cancel_task(&id);
    Ok(Json(json!({ "success": true, "cancelled": cancelled })))
}

/// Pushes supervised lines into the SSE response.
struct SseSink {
    tx: mpsc::Sender<Event>,
}

#[async_trait::async_trait]
impl LineSink for SseSink {
    async fn send_line(&self, line: String) -> Result<(), SinkClosed> {
        self.tx
            .send(Event::default().data(line))
            .await
            .map_err(|_| SinkClosed)
    }

    async fn keepalive(&self) -> Result<(), SinkClosed> {
        self.tx
            .send(Event::default().comment("keepalive"))
            .await
            .map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

#[instrument(name = "autofill.tasks.stream", skip(state))]
async fn task_stream_handler(
    State(state): State<ServeState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = TaskId::from(task_id.as_str());
    if state.manager.progress_channel(&id).is_none() {
        return Err(ApiError::NotFound(task_id));
    }

    let (tx, mut rx) = mpsc::channel::<Event>(STREAM_BUFFER);
    let manager = Arc::clone(&state.manager);
    let limits = state.limits;
    tokio::spawn(async move {
        let sink = SseSink { tx };
        let outcome = supervise(&manager, &id, &sink, CancellationToken::new(), limits).await;
        match outcome {
            Ok(SupervisorOutcome::Completed(snapshot)) => {
                let event = Event::default().event("status").json_data(&snapshot);
                match event {
                    Ok(event) => {
                        let _ = sink.tx.send(event).await;
                    }
                    Err(err) => error!(task_id = %id, ?err, "failed to encode final snapshot"),
                }
            }
            Ok(outcome) => info!(task_id = %id, ?outcome, "stream ended early"),
            Err(err) => error!(task_id = %id, %err, "stream supervisor failed"),
        }
    });

    let stream = stream! {
        while let Some(event) = rx.recv().await {
            yield Ok::<Event, Infallible>(event);
        }
    };
    Ok(Sse::new(stream).into_response())
}
