//! SQLite backend for the cardlink contact lifecycle.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each operation module holds plain
//! synchronous functions over a [`rusqlite::Connection`]; [`SqliteStore`]
//! runs them inside one transaction per call.

mod assignments;
mod contacts;
mod encode;
mod events;
mod history;
mod identity;
mod import;
mod lifecycle;
mod schema;
mod staleness;
mod store;
mod tasks;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
