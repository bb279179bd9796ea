//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{authenticate, register as register_user, RegistrationRequest};
use crate::db::UserRepository;
use crate::web::dto::{
    ApiResponse, AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserInfo,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

use super::AppState;

fn auth_response(state: &AppState, user: crate::db::User) -> Result<AuthResponse, ApiError> {
    let access_token = state.tokens.issue(user.id, &user.username)?;
    Ok(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.tokens.expiry_secs(),
        user: UserInfo::from(user),
    })
}

/// POST /api/auth/register - User registration.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let request = RegistrationRequest::new(req.username, req.email, req.password);
    let user = register_user(&state.db, state.files.storage(), &request).await?;

    let response = auth_response(&state, user)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(response))))
}

/// POST /api/auth/login - Log in with email and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let user = authenticate(&state.db, &req.email, &req.password)
        .await
        .map_err(|e| match e {
            crate::VaultError::Auth(_) => ApiError::unauthorized("Invalid email or password"),
            other => ApiError::from(other),
        })?;

    tracing::info!(user_id = user.id, "User logged in");
    let response = auth_response(&state, user)?;
    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/auth/logout - End the session.
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(user: AuthUser) -> Json<ApiResponse<MessageResponse>> {
    tracing::info!(user_id = user.id(), "User logged out");
    Json(ApiResponse::new(MessageResponse::new("Logged out successfully")))
}

/// GET /api/auth/me - Get current user info.
///
/// Also served as GET /api/auth/session.
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_id(user.id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::new(UserInfo::from(user))))
}
