//! Domain types, repository contracts and cache primitives for inkpress.
//!
//! Everything in this crate is free of I/O. Backends and decorators live in
//! the `inkpress` binary crate.

pub mod account;
pub mod article;
pub mod cache;
pub mod metrics;
pub mod storage;
