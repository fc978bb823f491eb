use crate::error::Error;
use crate::models::from_timestamp;
use time::UtcDateTime;

/// A single-use magic-link token.
///
/// Lifecycle: `issued -> consumed` or `issued -> expired`, both terminal. Expiry
/// is never written; it is detected when the token is presented.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AuthToken {
    pub email: String,
    pub token: String,
    pub expires_at: UtcDateTime,
    pub used: bool,
    pub created_at: UtcDateTime,
}
impl AuthToken {
    /// Whether the token could still be consumed at `now`.
    pub fn is_valid_at(&self, now: UtcDateTime) -> bool {
        !self.used && self.expires_at > now
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TokenRow {
    email: String,
    token: String,
    expires_at: i64,
    used: bool,
    created_at: i64,
}
impl TryFrom<TokenRow> for AuthToken {
    type Error = Error;
    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            email: row.email,
            token: row.token,
            expires_at: from_timestamp(row.expires_at, "token expiry")?,
            used: row.used,
            created_at: from_timestamp(row.created_at, "token creation date")?,
        })
    }
}
