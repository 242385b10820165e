//! List REST API Routes
//!
//! Upload, browse, delete and resume distributed lists. Admin only.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use roster_core::ListId;

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    middleware::AdminPrincipal,
    services,
    state::{AppState, SharedStore},
    types::{
        ListDetailResponse, ListEnvelope, ListListsResponse, MessageResponse,
        ResumeUploadResponse, UploadListMultipart,
    },
};

/// Pull the `file` part out of a multipart body.
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_field("file", format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::invalid_field("file", "File name is required"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid_field("file", format!("Failed to read file: {}", e)))?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiError::invalid_field("file", "No file uploaded"))
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/lists/upload - Upload a file and distribute it across five agents
#[utoipa::path(
    post,
    path = "/api/lists/upload",
    tag = "Lists",
    request_body(content = UploadListMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded and distributed", body = ListEnvelope),
        (
            status = 400,
            description = "Unsupported file, no valid rows or fewer than five active agents",
            body = ApiError
        ),
        (status = 413, description = "File too large"),
        (
            status = 500,
            description = "Distribution failed midway; list marked failed",
            body = ApiError
        ),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_list(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (file_name, bytes) = read_file_field(&mut multipart).await?;
    let list = services::upload_list(store.as_ref(), admin, &file_name, bytes, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ListEnvelope::new("File uploaded and distributed", list)),
    ))
}

/// GET /api/lists - The caller's lists, newest first
#[utoipa::path(
    get,
    path = "/api/lists",
    tag = "Lists",
    responses(
        (status = 200, description = "Lists retrieved", body = ListListsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_lists(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
) -> ApiResult<Json<ListListsResponse>> {
    let lists = services::list_uploads(store.as_ref(), admin).await?;
    Ok(Json(ListListsResponse::new(&lists)))
}

/// GET /api/lists/{id} - A list with its distributions and tasks
#[utoipa::path(
    get,
    path = "/api/lists/{id}",
    tag = "Lists",
    params(("id" = String, Path, description = "List ID")),
    responses(
        (status = 200, description = "List details", body = ListDetailResponse),
        (status = 404, description = "List not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_list(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<ListDetailResponse>> {
    let id: ListId = id.parse()?;
    let list = services::get_upload_detail(store.as_ref(), admin, id).await?;
    Ok(Json(ListDetailResponse {
        message: "List retrieved successfully".to_string(),
        list,
    }))
}

/// DELETE /api/lists/{id} - Delete a list, its tasks and its counter increments
#[utoipa::path(
    delete,
    path = "/api/lists/{id}",
    tag = "Lists",
    params(("id" = String, Path, description = "List ID")),
    responses(
        (status = 200, description = "List deleted successfully", body = MessageResponse),
        (status = 404, description = "List not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_list(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id: ListId = id.parse()?;
    services::delete_upload(store.as_ref(), admin, id).await?;
    Ok(Json(MessageResponse::new("List deleted successfully")))
}

/// POST /api/lists/{id}/resume - Finish a partially distributed upload
#[utoipa::path(
    post,
    path = "/api/lists/{id}/resume",
    tag = "Lists",
    params(("id" = String, Path, description = "List ID")),
    responses(
        (status = 200, description = "Distribution completed", body = ResumeUploadResponse),
        (status = 400, description = "An assigned agent no longer exists", body = ApiError),
        (status = 404, description = "List not found", body = ApiError),
        (status = 500, description = "A commit failed again", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn resume_list(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<ResumeUploadResponse>> {
    let id: ListId = id.parse()?;
    let (list, commits_applied) =
        services::resume_upload(store.as_ref(), admin, id, Utc::now()).await?;
    Ok(Json(ResumeUploadResponse {
        message: "List distribution completed".to_string(),
        list,
        commits_applied,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the list routes router. Upload bodies are capped at
/// `config.upload_max_bytes`.
pub fn create_router(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(list_lists))
        .route(
            "/upload",
            post(upload_list).layer(DefaultBodyLimit::max(config.upload_max_bytes)),
        )
        .route("/:id", get(get_list).delete(delete_list))
        .route("/:id/resume", post(resume_list))
}
