use axum::{Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{ApiJson, ApiPath, validate_id};
use super::{AddTokenRequest, ApiError, AppState, MessageResponse, TokenDto, TokensResponse};

/// GET /get-tokens
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<TokensResponse>, ApiError> {
    let tokens = state.alias_service.list_tokens(user.id).await?;

    Ok(Json(TokensResponse {
        tokens: tokens.into_iter().map(TokenDto::from).collect(),
    }))
}

/// POST /add-token
pub async fn add_token(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<AddTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .alias_service
        .add_token(user.id, &payload.value, &payload.description)
        .await?;

    Ok(Json(MessageResponse::new("Token added successfully")))
}

/// DELETE /delete-token/{id}
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate_id("token", id)?;
    state.alias_service.delete_token(user.id, id).await?;
    Ok(Json(MessageResponse::new("Token deleted successfully")))
}
