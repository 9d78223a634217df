//! Storage implementations.
//!
//! `sqlite` holds the relational repositories that own the data. `cached`
//! holds decorators that put a [`Cache`](inkpress_core::cache::Cache) in
//! front of any repository implementation. Both satisfy the same traits, so
//! callers cannot tell which one they hold.

pub mod cached;
pub mod sqlite;

pub use cached::{CachedAccountRepository, CachedArticleRepository};
pub use sqlite::SqliteRepository;
