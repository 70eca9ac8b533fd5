use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::address::{Address, NewAddress};
pub use repositories::token::Token;
pub use repositories::user::User;

/// Shared handle to the database. Cloning is cheap; every clone uses the same
/// connection pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        // Every pooled connection to `:memory:` would open its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn address_repo(&self) -> repositories::address::AddressRepository {
        repositories::address::AddressRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_with_password(&self, username: &str) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn get_user_password_hash(&self, id: i32) -> Result<Option<String>> {
        self.user_repo().get_password_hash(id).await
    }

    pub async fn get_user_by_session_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().get_by_session_token(token).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(username, password_hash, is_admin)
            .await
    }

    pub async fn create_admin_if_empty(&self, username: &str, password_hash: &str) -> Result<bool> {
        self.user_repo()
            .create_admin_if_empty(username, password_hash)
            .await
    }

    pub async fn set_user_session(
        &self,
        id: i32,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.user_repo().set_session(id, token, expires_at).await
    }

    pub async fn clear_user_session(&self, id: i32) -> Result<()> {
        self.user_repo().clear_session(id).await
    }

    pub async fn clear_user_session_if(&self, id: i32, token: &str) -> Result<bool> {
        self.user_repo().clear_session_if(id, token).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        password_hash: &str,
        needs_reset: bool,
        revoke_session: bool,
    ) -> Result<bool> {
        self.user_repo()
            .update_password(id, password_hash, needs_reset, revoke_session)
            .await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete_with_owned(id).await
    }

    // ========================================================================
    // Upstream tokens
    // ========================================================================

    pub async fn list_tokens(&self, user_id: i32) -> Result<Vec<Token>> {
        self.token_repo().list_for_user(user_id).await
    }

    pub async fn add_token(&self, user_id: i32, value: &str, description: &str) -> Result<Token> {
        self.token_repo().add(user_id, value, description).await
    }

    pub async fn get_owned_token(&self, id: i32, user_id: i32) -> Result<Option<Token>> {
        self.token_repo().get_owned(id, user_id).await
    }

    pub async fn delete_token(&self, id: i32, user_id: i32) -> Result<bool> {
        self.token_repo().delete_owned(id, user_id).await
    }

    // ========================================================================
    // Addresses
    // ========================================================================

    pub async fn list_addresses(&self, user_id: i32) -> Result<Vec<Address>> {
        self.address_repo().list_for_user(user_id).await
    }

    pub async fn add_address(&self, address: NewAddress<'_>) -> Result<Address> {
        self.address_repo().add(address).await
    }

    pub async fn delete_address(&self, id: i32, user_id: i32) -> Result<bool> {
        self.address_repo().delete_owned(id, user_id).await
    }
}
