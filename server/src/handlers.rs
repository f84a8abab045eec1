use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::{
    dataset::{self, DatasetFormat},
    CancelResponse, SubmitResponse, TaskResults, TaskState, TaskSummary,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::archive::ARCHIVE_NAME;
use crate::error::ApiError;
use crate::state::AppState;
use crate::tasks::spawn_archiver;

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks", post(create_task).get(list_tasks))
        .route("/api/v1/tasks/:id", get(get_task))
        .route("/api/v1/tasks/:id/cancel", post(cancel_task))
        .route("/api/v1/tasks/:id/results", get(get_task_results))
        .route("/api/v1/tasks/:id/archive", get(download_archive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Recibe el CSV o xlsx, valida filas y lanza la tarea en segundo plano
async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| state.config.api_key.clone())
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "falta la API key (header {API_KEY_HEADER} u OPENAI_API_KEY)"
            ))
        })?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("el dataset subido está vacío".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let format = DatasetFormat::detect(content_type, &body);

    // errores de esquema se devuelven antes de crear la tarea
    let rows = dataset::load_rows_from_bytes(&body, format)?;
    let total = rows.len() as u64;

    let task_id = uuid::Uuid::new_v4().to_string();
    let output_dir = state.config.output_root.join(&task_id);

    let generator = state
        .collaborators
        .generator(&api_key)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let persistence = state.collaborators.persistence(&output_dir);

    let handle = state
        .supervisor
        .submit(task_id.clone(), rows, generator, persistence)?;
    spawn_archiver(state.clone(), handle, output_dir);

    info!("tarea {} creada con {} filas", task_id, total);
    Ok(Json(SubmitResponse { task_id, total }))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskSummary>> {
    let out = state
        .registry()
        .list()
        .into_iter()
        .map(|(task_id, state)| TaskSummary { task_id, state })
        .collect();
    Json(out)
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskState>, ApiError> {
    Ok(Json(state.registry().get(&id)?))
}

async fn cancel_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let st = state.registry().request_cancel(&id)?;
    info!("tarea {} cancelada a pedido del cliente", id);
    Ok(Json(CancelResponse {
        task_id: id,
        status: st.status,
    }))
}

// Lista las imágenes que devolvió el pipeline de la tarea
async fn get_task_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResults>, ApiError> {
    state.registry().get(&id)?;

    let output = state
        .outputs()
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("resultados de la tarea {id} aún no disponibles")))?;

    let files = output
        .files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();

    Ok(Json(TaskResults {
        task_id: id,
        output_dir: output.output_dir.to_string_lossy().to_string(),
        files,
    }))
}

async fn download_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.registry().get(&id)?;

    let zip_path = state
        .outputs()
        .get(&id)
        .and_then(|o| o.archive.clone())
        .ok_or_else(|| ApiError::NotFound(format!("zip de la tarea {id} no disponible")))?;

    let bytes = tokio::fs::read(&zip_path)
        .await
        .map_err(|e| ApiError::NotFound(format!("zip de la tarea {id} no disponible: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_NAME}\""),
            ),
        ],
        bytes,
    ))
}
