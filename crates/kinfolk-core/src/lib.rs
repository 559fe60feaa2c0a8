//! Core types and trait definitions for Kinfolk.
//!
//! This crate is deliberately free of HTTP, runtime and database
//! dependencies. The resolution services, the storage backends and the API
//! layer all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod federation;
pub mod media;
pub mod notification;
pub mod page;
pub mod person;
pub mod query;
pub mod store;

pub use error::{Error, Result};
