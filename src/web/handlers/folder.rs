//! Folder handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FolderResponse, MessageResponse, RenameRequest,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

use super::AppState;

/// POST /api/folders/create - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    let folder = state
        .files
        .create_folder(user.id(), &req.name, req.parent_folder_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FolderResponse::from(folder))),
    ))
}

/// DELETE /api/folders/:id - Delete a folder and everything in it.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(folder_id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.files.delete_folder(user.id(), folder_id).await?;
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "Folder deleted successfully",
    ))))
}

/// PUT /api/folders/:id/rename - Rename a folder.
pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(folder_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let folder = state
        .files
        .rename_folder(user.id(), folder_id, &req.new_name)
        .await?;
    Ok(Json(ApiResponse::new(FolderResponse::from(folder))))
}
