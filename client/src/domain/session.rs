//! Principal and session types held by the session store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// Remote account identifier.
    pub id: Uuid,
    /// Account email, if the service reported one.
    pub email: Option<String>,
    /// Opaque profile metadata owned by the remote service.
    pub metadata: Value,
}

/// Bearer token that never prints its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    /// Wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Expose the token for an outbound header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(**redacted**)")
    }
}

/// Live credential pairing returned by the remote service.
///
/// ## Invariants
/// - A session always carries exactly one [`Principal`]; the two are created
///   and dropped together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Short-lived access token sent with every data request.
    pub access_token: SecretToken,
    /// Token exchanged for a fresh session once the access token expires.
    pub refresh_token: SecretToken,
    /// Instant after which the access token is no longer accepted.
    pub expires_at: DateTime<Utc>,
    /// The signed-in user.
    pub principal: Principal,
}

impl Session {
    /// Whether the access token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Build a session for `email` that expires at `expires_at`.
#[cfg(test)]
pub(crate) fn test_session(email: &str, expires_at: DateTime<Utc>) -> Session {
    Session {
        access_token: SecretToken::new(format!("access-{email}")),
        refresh_token: SecretToken::new(format!("refresh-{email}")),
        expires_at,
        principal: Principal {
            id: Uuid::new_v4(),
            email: Some(email.to_owned()),
            metadata: serde_json::json!({}),
        },
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::Duration;

    #[test]
    fn debug_output_redacts_tokens() {
        let session = test_session("a@b.com", Utc::now());
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("access-a@b.com"), "token leaked: {rendered}");
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Utc::now();
        assert!(test_session("a@b.com", now).is_expired_at(now));
        assert!(!test_session("a@b.com", now + Duration::seconds(1)).is_expired_at(now));
    }
}
