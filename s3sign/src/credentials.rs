//! Credentials definitions.
//!
//! Sourcing credentials (files, env, instance metadata) is left to the caller;
//! this module only carries the values the signer needs.

use std::fmt::{Debug, Formatter};
use time::OffsetDateTime;

#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Sent as `x-amz-security-token` when present.
    pub security_token: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        security_token: Option<String>,
        expires_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token,
            expires_at,
        }
    }

    /// Whether the credentials expire before `at`.
    pub fn is_expired_at(&self, at: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= at)
    }
}

// secret and token stay out of logs
impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("security_token", &self.security_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
