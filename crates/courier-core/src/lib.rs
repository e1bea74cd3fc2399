//! Core types and trait definitions for the Courier message store.
//!
//! Nothing here touches a database. Backends such as `courier-store-sqlite`
//! implement the traits in [`store`], and the sync processor and the story
//! settings repository are written against those traits alone.

// Trait futures carry explicit `Send` bounds where callers need them.
#![allow(async_fn_in_trait)]

pub mod change;
pub mod distribution;
pub mod error;
pub mod ids;
pub mod message;
pub mod recipient;
pub mod repository;
pub mod selection;
pub mod settings;
pub mod store;
pub mod story_send;
pub mod sync;
pub mod wire;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
