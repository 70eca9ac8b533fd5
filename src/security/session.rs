use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::constants::auth::SESSION_TOKEN_BYTES;

/// A freshly minted bearer token and when it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Mints opaque session tokens: 256 bits from the thread-local CSPRNG, hex encoded.
/// The token carries no structure; only the database row gives it meaning.
#[derive(Debug, Clone, Copy)]
pub struct SessionIssuer {
    ttl: Option<Duration>,
}

impl SessionIssuer {
    #[must_use]
    pub const fn new(ttl: Option<Duration>) -> Self {
        Self { ttl }
    }

    pub fn issue(&self) -> anyhow::Result<IssuedSession> {
        self.issue_at(Utc::now())
    }

    /// Fails when `now + ttl` is outside the representable date range.
    pub fn issue_at(&self, now: DateTime<Utc>) -> anyhow::Result<IssuedSession> {
        let expires_at = match self.ttl {
            Some(ttl) => Some(
                now.checked_add_signed(ttl)
                    .context("Session expiry is out of range")?,
            ),
            None => None,
        };

        Ok(IssuedSession {
            token: random_hex(SESSION_TOKEN_BYTES),
            expires_at,
        })
    }
}

/// Random bytes from the thread-local CSPRNG as lowercase hex.
#[must_use]
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);

    bytes.iter().fold(String::with_capacity(len * 2), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// `true` once `expires_at` (RFC 3339) is in the past. Unparseable values
/// count as expired.
#[must_use]
pub fn is_expired(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    match expires_at {
        None => false,
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|at| at.with_timezone(&Utc) <= now)
            .unwrap_or(true),
    }
}
