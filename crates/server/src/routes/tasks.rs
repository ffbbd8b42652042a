use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use db::{
    models::task::{CreateTask, Task, TaskPage, UpdateTask},
    query::TaskListOptions,
    stats::TaskStatistics,
};
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState, error::ApiError, http::auth::AuthUser, middleware::load_task_middleware,
};

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(options): Query<TaskListOptions>,
) -> Result<ResponseJson<ApiResponse<TaskPage>>, ApiError> {
    let page = Task::list_for_user(state.db(), user.id, &options).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let id = Uuid::new_v4();

    tracing::debug!("Creating task '{}' for user {}", payload.title, user.id);

    let task = Task::create(state.db(), user.id, &payload, id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    // Use existing values if not provided in update
    let title = payload.title.unwrap_or(existing_task.title);
    let description = match payload.description {
        Some(s) if s.trim().is_empty() => None, // Empty string = clear description
        Some(s) => Some(s),                     // Non-empty string = update description
        None => existing_task.description,      // Field omitted = keep existing
    };
    let status = payload.status.unwrap_or(existing_task.status);
    let priority = payload.priority.unwrap_or(existing_task.priority);
    let is_urgent = payload.is_urgent.unwrap_or(existing_task.is_urgent);
    let due_date = match payload.due_date {
        Some(due_date) => due_date,        // Explicit value or null = set or clear
        None => existing_task.due_date,    // Field omitted = keep existing
    };

    let task = Task::update(
        state.db(),
        existing_task.id,
        title,
        description,
        status,
        priority,
        is_urgent,
        due_date,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = Task::delete(state.db(), task.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_task_stats(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<TaskStatistics>>, ApiError> {
    let stats = Task::statistics_for_user(state.db(), user.id).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task))
        .route("/", put(update_task))
        .route("/", delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/stats", get(get_task_stats))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
