use crate::error::Error;
use crate::models::from_timestamp;
use time::UtcDateTime;

pub type UserId = i64;

/// An account, created the first time an email address completes a magic-link login.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub created_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    email: String,
    created_at: i64,
}
impl TryFrom<UserRow> for User {
    type Error = Error;
    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self { id: row.id, email: row.email, created_at: from_timestamp(row.created_at, "user creation date")? })
    }
}
