//! One-shot seeding of the first administrator account.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::constants::auth::{BOOTSTRAP_ADMIN_USERNAME, INSECURE_DEFAULT_ADMIN_PASSWORD};
use crate::db::Store;
use crate::security::PasswordHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    /// The store already held at least one user.
    Skipped,
}

/// Creates `admin` if and only if the user store is empty.
///
/// Must finish before the listener accepts traffic. The emptiness check is
/// repeated inside the insert transaction, so a failed hash or insert leaves
/// the store untouched.
pub async fn ensure_default_admin(
    store: &Store,
    hasher: &PasswordHasher,
    admin_password: Option<&str>,
) -> Result<BootstrapOutcome> {
    let count = store
        .count_users()
        .await
        .context("Error checking user count")?;
    if count > 0 {
        return Ok(BootstrapOutcome::Skipped);
    }

    let password = match admin_password {
        Some(password) if !password.is_empty() => password,
        _ => {
            warn!(
                "ADMIN_PASSWORD not set. Seeding '{}' with the well-known default password. Change it immediately.",
                BOOTSTRAP_ADMIN_USERNAME
            );
            INSECURE_DEFAULT_ADMIN_PASSWORD
        }
    };

    let password_hash = hasher
        .hash(password)
        .await
        .context("Failed to hash admin password")?;

    let created = store
        .create_admin_if_empty(BOOTSTRAP_ADMIN_USERNAME, &password_hash)
        .await?;

    if created {
        info!(
            "Created default admin account. Username: {}",
            BOOTSTRAP_ADMIN_USERNAME
        );
        Ok(BootstrapOutcome::Created)
    } else {
        Ok(BootstrapOutcome::Skipped)
    }
}
