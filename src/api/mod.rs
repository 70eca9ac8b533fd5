use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::clients::AliasProvider;
use crate::clients::duckduckgo::DuckClient;
use crate::config::Config;
use crate::db::Store;
use crate::security::{PasswordHasher, SessionIssuer};
use crate::services::{
    AliasService, AuthService, SeaOrmAliasService, SeaOrmAuthService, SeaOrmUserService,
    UserService,
};

mod addresses;
mod admin;
pub mod auth;
mod error;
mod observability;
mod system;
mod tokens;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub hasher: PasswordHasher,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub alias_service: Arc<dyn AliasService>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires the services around an already opened store and alias provider.
pub fn create_app_state(
    config: Config,
    store: Store,
    provider: Arc<dyn AliasProvider>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let hasher = PasswordHasher::new(&config.security)?;
    let sessions = SessionIssuer::new(config.session_ttl());

    let auth_service = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        hasher.clone(),
        sessions,
    )) as Arc<dyn AuthService>;

    let user_service =
        Arc::new(SeaOrmUserService::new(store.clone(), hasher.clone())) as Arc<dyn UserService>;

    let alias_service =
        Arc::new(SeaOrmAliasService::new(store.clone(), provider)) as Arc<dyn AliasService>;

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        store,
        hasher,
        auth_service,
        user_service,
        alias_service,
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let provider = Arc::new(DuckClient::new(&config.upstream)?) as Arc<dyn AliasProvider>;

    create_app_state(config, store, provider, prometheus_handle)
}

pub fn router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(system::health));

    let protected_routes = auth::authenticated(create_protected_router(), state.clone());
    let admin_routes = auth::admin_only(create_admin_router(), state.clone());

    let mut app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state.clone());

    let static_dir = Path::new(&state.config.server.static_dir);
    if static_dir.is_dir() {
        info!("Serving static assets from {}", static_dir.display());
        app = app.nest_service("/static", ServeDir::new(static_dir));

        let index = static_dir.join("index.html");
        if index.is_file() {
            app = app.route_service("/", ServeFile::new(index));
        }
    }

    let cors_origins = &state.config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    app.layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/check-auth", get(auth::check_auth))
        .route("/change-password", post(auth::change_password))
        .route("/logout", post(auth::logout))
        .route("/get-tokens", get(tokens::list_tokens))
        .route("/add-token", post(tokens::add_token))
        .route("/delete-token/{id}", delete(tokens::delete_token))
        .route("/generate-address", post(addresses::generate_address))
        .route("/addresses", get(addresses::list_addresses))
        .route("/address/{id}", delete(addresses::delete_address))
}

fn create_admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/create-user", post(admin::create_user))
        .route("/admin/delete-user/{id}", delete(admin::delete_user))
        .route("/admin/reset-password/{id}", post(admin::reset_password))
        .route("/metrics", get(observability::get_metrics))
}
