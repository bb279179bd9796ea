//! File handlers.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{HierarchyNavigator, UploadRequest};
use crate::web::dto::{
    ApiResponse, FileResponse, ListQuery, ListResponse, MessageResponse, MoveRequest,
    RenameRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

use super::AppState;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped, quotes and backslashes replaced in the
/// ASCII fallback, and non-ASCII names carried in an RFC 5987
/// `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let plain = filename.is_ascii()
        && !filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');
    if plain {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() => c,
            _ => '_',
        })
        .collect();
    let clean: String = filename.chars().filter(|c| !c.is_control()).collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(&clean)
    )
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("File too large")
    } else {
        tracing::warn!(error = %e, "Failed to read multipart field");
        ApiError::bad_request("Invalid multipart data")
    }
}

fn parse_folder_id(raw: &str) -> Result<Option<i64>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::bad_request("Invalid folder_id"))
}

/// POST /api/files/upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field and an optional
/// "folder_id" field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut folder_id: Option<i64> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "folder_id" => {
                folder_id = parse_folder_id(&field.text().await.map_err(multipart_error)?)?;
            }
            _ => {}
        }
    }

    let filename = filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;

    if content.len() as u64 > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let mut request = UploadRequest::new(filename, content);
    if let Some(id) = folder_id {
        request = request.in_folder(id);
    }
    let file = state.files.upload(user.id(), &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(file))),
    ))
}

/// GET /api/files/download/:id - Download a file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let download = state.files.download(user.id(), file_id).await?;
    let file = download.file;

    Response::builder()
        .header(header::CONTENT_TYPE, file.mime_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file.original_filename),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!(file_id, error = %e, "Failed to build response");
            ApiError::internal("Failed to build response")
        })
}

/// GET /api/files/list - List a folder's immediate contents.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ListResponse>>, ApiError> {
    let listing = HierarchyNavigator::new(&state.db)
        .list_children(user.id(), query.folder_id)
        .await?;

    Ok(Json(ApiResponse::new(ListResponse::from(listing))))
}

/// DELETE /api/files/:id - Delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.files.delete_file(user.id(), file_id).await?;
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "File deleted successfully",
    ))))
}

/// PUT /api/files/:id/rename - Rename a file.
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .files
        .rename_file(user.id(), file_id, &req.new_name)
        .await?;
    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}

/// PUT /api/files/:id/move - Move a file to another folder.
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<i64>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .files
        .move_file(user.id(), file_id, req.folder_id)
        .await?;
    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}
