use axum::{Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{ApiJson, ApiPath, validate_id};
use super::{
    AddressDto, AddressesResponse, ApiError, AppState, GenerateAddressRequest,
    GenerateAddressResponse, MessageResponse,
};

/// POST /generate-address
/// Requests a fresh alias from the provider with one of the caller's tokens.
/// The reply carries the converted address, which is what the user hands out.
pub async fn generate_address(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<GenerateAddressRequest>,
) -> Result<Json<GenerateAddressResponse>, ApiError> {
    let token_id = validate_id("token", payload.token_id)?;

    let address = state
        .alias_service
        .generate_address(user.id, token_id, &payload.real_address)
        .await?;

    Ok(Json(GenerateAddressResponse {
        generated_address: address.converted_address,
    }))
}

/// GET /addresses
pub async fn list_addresses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<AddressesResponse>, ApiError> {
    let addresses = state.alias_service.list_addresses(user.id).await?;

    Ok(Json(AddressesResponse {
        addresses: addresses.into_iter().map(AddressDto::from).collect(),
    }))
}

/// DELETE /address/{id}
pub async fn delete_address(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate_id("address", id)?;
    state.alias_service.delete_address(user.id, id).await?;
    Ok(Json(MessageResponse::new("Address deleted successfully")))
}
