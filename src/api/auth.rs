use axum::{
    Json, Router,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

use super::validation::ApiJson;
use super::{
    ApiError, AppState, ChangePasswordRequest, CredentialsRequest, LoginResponse, MessageResponse,
    UserResponse,
};
use crate::services::{AuthError, UserInfo};

// ============================================================================
// Request identity
// ============================================================================

/// Identity resolved by [`require_auth`] for the current request.
///
/// Only the authentication gate can construct one, so a handler or layer
/// holding a `CurrentUser` knows the bearer token was checked.
#[derive(Debug, Clone)]
pub struct CurrentUser(UserInfo);

impl CurrentUser {
    #[must_use]
    pub fn info(&self) -> &UserInfo {
        &self.0
    }
}

impl Deref for CurrentUser {
    type Target = UserInfo;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Reading the identity outside an authenticated route fails closed with 401.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))
    }
}

// ============================================================================
// Gates
// ============================================================================

/// Routes behind the authentication gate.
pub fn authenticated(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router<Arc<AppState>> {
    routes.route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Routes behind the authentication gate followed by the administrator gate.
/// The later `route_layer` wraps the earlier one, so authentication always
/// runs first.
pub fn admin_only(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router<Arc<AppState>> {
    routes
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Authentication gate: resolves the `Authorization` header to a user and
/// attaches it to the request.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).unwrap_or_default();

    let user = match state.auth_service.authenticate(token).await {
        Ok(user) => user,
        Err(e) => {
            let reason = match &e {
                AuthError::MissingToken => "missing_token",
                AuthError::SessionExpired => "expired_token",
                AuthError::InvalidToken => "invalid_token",
                _ => "error",
            };
            if reason != "error" {
                metrics::counter!("auth_failures_total", "reason" => reason).increment(1);
                debug!(reason, "Rejected request at authentication gate");
            }
            return Err(e.into());
        }
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Authorization gate: only lets administrators through. Must be composed
/// after [`require_auth`]; without an attached identity it rejects with 401.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(user) = request.extensions().get::<CurrentUser>() else {
        warn!("Administrator gate reached without an authenticated identity");
        return Err(ApiError::Unauthorized("User not found in context".to_string()));
    };

    if !user.is_admin {
        metrics::counter!("auth_failures_total", "reason" => "not_admin").increment(1);
        warn!(user_id = user.id, "Non-admin user denied administrator route");
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// The header carries the raw token. A `Bearer ` scheme prefix is tolerated.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim_start();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;

    Ok(Json(MessageResponse::new("User registered successfully")))
}

/// POST /login
/// Authenticate with username and password, returns a fresh session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let result = match state
        .auth_service
        .login(&payload.username, &payload.password)
        .await
    {
        Ok(result) => result,
        Err(AuthError::InvalidCredentials) => {
            metrics::counter!("auth_failures_total", "reason" => "bad_credentials").increment(1);
            warn!("Invalid login attempt for user: {}", payload.username);
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: result.token,
        user: result.user,
    }))
}

/// GET /check-auth
pub async fn check_auth(user: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        user: user.info().clone(),
    })
}

/// POST /change-password
/// Requires the current password; the session stays valid afterwards
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.old_password.is_empty() {
        return Err(ApiError::validation("Old password is required"));
    }

    state
        .auth_service
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// POST /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service.logout(user.id).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}
