//! Credential primitives: password digests and session bearer tokens.

pub mod password;
pub mod session;

pub use password::PasswordHasher;
pub use session::{IssuedSession, SessionIssuer};
