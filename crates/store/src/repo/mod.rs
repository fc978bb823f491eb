//! One repository per relation.
//!
//! Repositories are cheap to clone (they only hold the pool) and every method
//! is a single logical operation: it acquires a connection, runs its
//! statement(s), and releases the connection. Operations that need more than
//! one statement run inside a transaction that rolls back when dropped on
//! error.

mod history;
mod streams;
mod tokens;
mod users;

pub use self::history::History;
pub use self::streams::StreamCache;
pub use self::tokens::AuthTokens;
pub use self::users::Users;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;

fn to_u64(value: i64, field: &'static str) -> Result<u64> {
    u64::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}
