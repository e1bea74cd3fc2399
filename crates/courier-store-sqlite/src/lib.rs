//! SQLite backend for the Courier message store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod key_value;
mod lists;
mod messages;
mod recipients;
mod schema;
mod store;

pub mod error;
pub mod observe;

pub use error::{Error, Result};
pub use observe::Observation;
pub use store::{ChangeListener, SqliteStore};

#[cfg(test)]
mod tests;
