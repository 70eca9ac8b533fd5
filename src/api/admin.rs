use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::info;

use super::auth::CurrentUser;
use super::validation::{ApiJson, ApiPath, validate_id};
use super::{
    ApiError, AppState, CreateUserRequest, MessageResponse, ResetPasswordRequest, UserDto,
    UsersResponse,
};

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.user_service.list_users().await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserDto::from).collect(),
    }))
}

/// POST /admin/create-user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let created = state
        .user_service
        .create_user(&payload.username, &payload.password, payload.is_admin)
        .await?;

    info!(
        admin_id = admin.id,
        user_id = created.id,
        is_admin = created.is_admin,
        "Administrator created user {}",
        created.username
    );

    Ok(Json(MessageResponse::new("User created successfully")))
}

/// DELETE /admin/delete-user/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate_id("user", id)?;

    state.user_service.delete_user(admin.id, id).await?;

    info!(admin_id = admin.id, user_id = id, "Administrator deleted user");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// POST /admin/reset-password/{id}
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate_id("user", id)?;

    state
        .user_service
        .reset_password(id, &payload.password)
        .await?;

    info!(
        admin_id = admin.id,
        user_id = id,
        "Administrator reset user password"
    );
    Ok(Json(MessageResponse::new("Password reset successfully")))
}
