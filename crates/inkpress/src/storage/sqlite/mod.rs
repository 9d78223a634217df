//! SQLite storage backend implementation.
//!
//! Uses `rusqlite` for statements and `tokio-rusqlite` to run them on a
//! dedicated connection thread.

mod account;
mod article;
mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::{SqliteRepository, DEFAULT_TAG_BATCH_SIZE};
