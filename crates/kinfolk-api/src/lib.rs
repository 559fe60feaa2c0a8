//! JSON REST API for Kinfolk people resolution.
//!
//! Exposes an axum [`Router`] backed by a [`PeopleService`]. Authentication,
//! TLS and transport concerns are the caller's responsibility: whatever
//! authenticates a request inserts a [`CurrentViewer`] extension, and
//! requests without one are treated as anonymous.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(kinfolk_api::api_router(service.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod profiles;
pub mod search;
pub mod viewer;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kinfolk_core::{federation::FederationClient, store::Store};
use kinfolk_people::PeopleService;

pub use error::ApiError;
pub use viewer::{CurrentViewer, RequireViewer};

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, F>(service: Arc<PeopleService<S, F>>) -> Router<()>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  Router::new()
    // Search
    .route("/people", get(search::search::<S, F>))
    .route("/people/refresh_search", get(search::refresh::<S, F>))
    .route("/people/retrieve_remote", post(search::retrieve_remote::<S, F>))
    // Profiles
    .route("/people/{id}", get(profiles::show::<S, F>))
    .route("/u/{username}", get(profiles::by_username::<S, F>))
    .route("/people/{id}/hovercard", get(profiles::hovercard::<S, F>))
    .route("/people/{id}/stream", get(profiles::stream::<S, F>))
    .route("/people/{id}/last_post", get(profiles::last_post::<S, F>))
    // Contacts
    .route("/people/{id}/contacts", get(contacts::list::<S, F>))
    .route(
      "/people/{id}/aspect_membership",
      get(contacts::aspect_membership::<S, F>),
    )
    .with_state(service)
}
