mod history;
mod stream;
mod token;
mod user;

pub use self::history::HistoryEntry;
pub(crate) use self::history::HistoryRow;
pub use self::stream::StreamCacheEntry;
pub(crate) use self::stream::StreamRow;
pub use self::token::AuthToken;
pub(crate) use self::token::TokenRow;
pub use self::user::{User, UserId};
pub(crate) use self::user::UserRow;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

/// Timestamps are persisted as UTC unix seconds.
pub(crate) fn to_timestamp(at: UtcDateTime) -> i64 {
    at.unix_timestamp()
}

pub(crate) fn from_timestamp(ts: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(ts).or_raise(|| ErrorKind::InvalidData(field))
}
