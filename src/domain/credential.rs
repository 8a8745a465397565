use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Lifetime of an issued assertion
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Header announcing the kind of bearer token sent to Snowflake
pub const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";

/// Value of [`TOKEN_TYPE_HEADER`] for key-pair assertions
pub const KEYPAIR_JWT: &str = "KEYPAIR_JWT";

/// A signed, time-boxed key-pair assertion
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    assertion: String,
    account: String,
    user: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        assertion: impl Into<String>,
        account: impl Into<String>,
        user: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            assertion: assertion.into(),
            account: account.into(),
            user: user.into(),
            issued_at,
            expires_at: issued_at + Duration::seconds(ASSERTION_LIFETIME_SECS),
        }
    }

    pub fn assertion(&self) -> &str {
        &self.assertion
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True once `now` is within `margin` of expiry (or past it)
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.is_expired_at(now + margin)
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.assertion)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("assertion", &"[REDACTED]")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
