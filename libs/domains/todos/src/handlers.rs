use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use axum_helpers::{
    IdPath, JsonBody,
    errors::responses::{
        BadRequestIdResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{TodoError, TodoResult};
use crate::models::{
    ClearCompletedResponse, CreateTodo, PriorityFilter, ReorderTodos, SortKey, StatusFilter, Todo,
    TodoExport, TodoPriority, TodoQuery, TodoStats, TodoView, UpdateTodo,
};
use crate::repository::TodoRepository;
use crate::service::TodoService;

const TAG: &str = "todos";

/// OpenAPI documentation for Todos API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_todos,
        create_todo,
        update_todo,
        toggle_todo,
        delete_todo,
        clear_completed,
        export_todos,
        reorder_todos,
    ),
    components(
        schemas(
            Todo,
            TodoPriority,
            CreateTodo,
            UpdateTodo,
            ReorderTodos,
            TodoView,
            TodoStats,
            TodoExport,
            PriorityFilter,
            StatusFilter,
            SortKey,
            ClearCompletedResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Todo list management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the todo router with all HTTP endpoints
pub fn router<R: TodoRepository + 'static>(service: TodoService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/{id}", put(update_todo).delete(delete_todo))
        .route("/{id}/toggle", patch(toggle_todo))
        .route("/clear/completed", delete(clear_completed))
        .route("/export", get(export_todos))
        .route("/reorder", post(reorder_todos))
        .with_state(shared_service)
}

/// List todos with optional filters and sort order
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(TodoQuery),
    responses(
        (status = 200, description = "Filtered todos with counts", body = TodoView),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_todos<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    Query(query): Query<TodoQuery>,
) -> TodoResult<Json<TodoView>> {
    let view = service.list_todos(query).await?;
    Ok(Json(view))
}

/// Create a new todo
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Todo created successfully", body = Todo),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    JsonBody(input): JsonBody<CreateTodo>,
) -> TodoResult<impl IntoResponse> {
    let todo = service.create_todo(input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Edit a todo's text and, optionally, its priority
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = u64, Path, description = "Todo ID")
    ),
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Todo updated successfully", body = Todo),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<UpdateTodo>,
) -> TodoResult<Json<Todo>> {
    let todo = service.update_todo(id, input).await?;
    Ok(Json(todo))
}

/// Flip a todo between pending and completed
#[utoipa::path(
    patch,
    path = "/{id}/toggle",
    tag = TAG,
    params(
        ("id" = u64, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Todo toggled", body = Todo),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn toggle_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    IdPath(id): IdPath,
) -> TodoResult<Json<Todo>> {
    let todo = service.toggle_todo(id).await?;
    Ok(Json(todo))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = u64, Path, description = "Todo ID")
    ),
    responses(
        (status = 204, description = "Todo deleted successfully"),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    IdPath(id): IdPath,
) -> TodoResult<StatusCode> {
    service.delete_todo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every completed todo
#[utoipa::path(
    delete,
    path = "/clear/completed",
    tag = TAG,
    responses(
        (status = 200, description = "Number of todos removed", body = ClearCompletedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn clear_completed<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
) -> TodoResult<Json<ClearCompletedResponse>> {
    let response = service.clear_completed().await?;
    Ok(Json(response))
}

/// Download the whole collection as a JSON attachment
#[utoipa::path(
    get,
    path = "/export",
    tag = TAG,
    responses(
        (status = 200, description = "Export file", body = TodoExport, content_type = "application/json"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn export_todos<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
) -> TodoResult<impl IntoResponse> {
    let export = service.export_todos().await?;
    let body = serde_json::to_string_pretty(&export)
        .map_err(|e| TodoError::Internal(format!("Failed to serialize export: {}", e)))?;
    let disposition = format!("attachment; filename=\"{}\"", export.file_name());

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Rearrange todos; ids not listed keep their relative order at the end
#[utoipa::path(
    post,
    path = "/reorder",
    tag = TAG,
    request_body = ReorderTodos,
    responses(
        (status = 204, description = "Todos reordered"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reorder_todos<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    JsonBody(input): JsonBody<ReorderTodos>,
) -> TodoResult<StatusCode> {
    service.reorder_todos(input).await?;
    Ok(StatusCode::NO_CONTENT)
}
