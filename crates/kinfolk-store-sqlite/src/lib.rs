//! SQLite backend for Kinfolk.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] implements every
//! storage trait in [`kinfolk_core::store`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{NewPerson, SqliteStore};
