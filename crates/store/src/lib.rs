//! SQLite persistence for the audiotube backend.
//!
//! The database is the system of record for four relations:
//! - **Users**: one row per email address that has completed a login.
//! - **AuthTokens**: single-use magic-link tokens, consumed atomically.
//! - **History**: an append-only log of what each user listened to.
//! - **StreamCache**: resolved audio URLs, served only while fresh.
//!
//! Every cross-request guarantee (single consumption of a token, duplicate-free
//! cache upserts) is delegated to SQLite; there is no in-process shared state.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::{Database, PoolOptions};
pub use crate::models::{AuthToken, HistoryEntry, StreamCacheEntry, User, UserId};
pub use crate::repo::{AuthTokens, History, StreamCache, Users};
