use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use rand::RngCore;
use tokio::task;

use crate::config::SecurityConfig;

/// Salted Argon2id digests in PHC string format.
///
/// Hashing and verification are CPU-bound, so the async entry points run on
/// the blocking pool. Verification reads the cost parameters from the stored
/// digest, so digests created under older parameters keep verifying.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Digest of a throwaway secret, verified against when a login names an
    /// unknown user so that both failure paths do the same work.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        let dummy_secret = crate::security::session::random_hex(16);
        let dummy_hash = hash_with(&params, &dummy_secret)?;

        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let params = self.params.clone();
        let password = password.to_string();

        task::spawn_blocking(move || hash_with(&params, &password))
            .await
            .context("Password hashing task panicked")?
    }

    /// Returns `Ok(false)` on mismatch. An unparseable digest is an error.
    pub async fn verify(&self, digest: &str, password: &str) -> Result<bool> {
        let digest = digest.to_string();
        let password = password.to_string();

        task::spawn_blocking(move || verify_with(&digest, &password))
            .await
            .context("Password verification task panicked")?
    }

    /// Burns one verification against the dummy digest. Always false.
    pub async fn verify_dummy(&self, password: &str) -> Result<bool> {
        let digest = Arc::clone(&self.dummy_hash);
        let password = password.to_string();

        task::spawn_blocking(move || verify_with(&digest, &password).map(|_| false))
            .await
            .context("Password verification task panicked")?
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow::anyhow!("Failed to encode password salt: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_with(digest: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(digest)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
