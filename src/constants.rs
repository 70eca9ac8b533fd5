pub const ALIAS_DOMAIN: &str = "@duck.com";

pub mod auth {

    pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

    /// Used only when `ADMIN_PASSWORD` is unset; startup warns loudly.
    pub const INSECURE_DEFAULT_ADMIN_PASSWORD: &str = "admin";

    pub const MIN_PASSWORD_LENGTH: usize = 8;

    pub const MAX_USERNAME_LENGTH: usize = 64;

    /// Upper bound for `security.session_ttl_hours` (ten years).
    pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

    /// Random bytes behind every session token.
    pub const SESSION_TOKEN_BYTES: usize = 32;
}

pub mod env {

    pub const DB_PATH: &str = "DB_PATH";

    pub const PORT: &str = "PORT";

    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
}

pub mod upstream {

    pub const DEFAULT_BASE_URL: &str = "https://quack.duckduckgo.com";

    pub const GENERATE_PATH: &str = "/api/email/addresses";
}
