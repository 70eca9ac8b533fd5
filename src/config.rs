use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::auth::MAX_SESSION_TTL_HOURS;
use crate::constants::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub upstream: UpstreamConfig,

    pub bootstrap: BootstrapConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:email_manager.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Directory served under `/static`. Skipped when it does not exist.
    pub static_dir: String,

    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            static_dir: "static".to_string(),
            shutdown_grace_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Lifetime of a session token issued at login. 0 keeps tokens valid
    /// until the next login or logout.
    pub session_ttl_hours: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            session_ttl_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: crate::constants::upstream::DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Password for the `admin` account seeded into an empty user store.
    /// Never written back to disk.
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            upstream: UpstreamConfig::default(),
            bootstrap: BootstrapConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Values pulled from the process environment on top of the file config.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub database_path: Option<String>,
    pub port: Option<String>,
    pub admin_password: Option<String>,
}

impl EnvOverrides {
    #[must_use]
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            database_path: read(env::DB_PATH),
            port: read(env::PORT),
            admin_password: read(env::ADMIN_PASSWORD),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env(EnvOverrides::from_env())?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Layers environment values over the loaded config. The database path
    /// accepts either a bare file path or a full `sqlite:` URL.
    pub fn apply_env(&mut self, overrides: EnvOverrides) -> Result<()> {
        if let Some(path) = overrides.database_path {
            self.general.database_path = if path.starts_with("sqlite:") {
                path
            } else {
                format!("sqlite:{path}")
            };
        }

        if let Some(port) = overrides.port {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid {} value: {port}", env::PORT))?;
        }

        if overrides.admin_password.is_some() {
            self.bootstrap.admin_password = overrides.admin_password;
        }

        Ok(())
    }

    /// Logs a warning for every location or credential still at its default.
    /// Called once at startup after logging is initialised.
    pub fn warn_on_defaults(&self) {
        let defaults = Self::default();

        if self.general.database_path == defaults.general.database_path {
            warn!(
                "{} not set, using default database location {}",
                env::DB_PATH,
                self.general.database_path
            );
        }

        if self.server.port == defaults.server.port {
            warn!(
                "{} not set, listening on default port {}",
                env::PORT,
                self.server.port
            );
        }

        if self.bootstrap.admin_password.is_none() {
            warn!(
                "{} not set, an empty user store will be seeded with the insecure default admin password",
                env::ADMIN_PASSWORD
            );
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("anonymail").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".anonymail").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        argon2::Params::new(
            self.security.argon2_memory_cost_kib,
            self.security.argon2_time_cost,
            self.security.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        if self.security.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            anyhow::bail!(
                "security.session_ttl_hours must be at most {MAX_SESSION_TTL_HOURS} (got {})",
                self.security.session_ttl_hours
            );
        }

        url::Url::parse(&self.upstream.base_url)
            .with_context(|| format!("Invalid upstream base URL: {}", self.upstream.base_url))?;

        Ok(())
    }

    /// `None` when expiry is disabled. Values past what `validate` accepts are
    /// clamped to the maximum lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Option<chrono::TimeDelta> {
        match self.security.session_ttl_hours {
            0 => None,
            hours => {
                let hours = i64::try_from(hours.min(MAX_SESSION_TTL_HOURS)).ok()?;
                chrono::TimeDelta::try_hours(hours)
            }
        }
    }
}
