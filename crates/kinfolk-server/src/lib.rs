//! HTTP server for Kinfolk.
//!
//! Wires the JSON API from [`kinfolk_api`] to a concrete store, a WebFinger
//! federation client and Basic auth for the node's single local account.

pub mod auth;
pub mod error;
pub mod webfinger;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware};
use kinfolk_core::{federation::FederationClient, store::Store};
use kinfolk_people::{DiscoverySettings, PeopleService, PeopleSettings};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, authenticate};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `KINFOLK_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// Domain of this node; the local account's handle is
  /// `auth_username@domain`.
  pub domain:             String,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  #[serde(default)]
  pub people:             PeopleSettings,
  #[serde(default)]
  pub discovery:          DiscoveryConfig,
}

/// The `[discovery]` section: the resolver limits plus transport options.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
  #[serde(flatten)]
  pub limits: DiscoverySettings,
  /// Scheme used for WebFinger requests.
  pub scheme: String,
}

impl DiscoveryConfig {
  pub fn timeout(&self) -> Duration { self.limits.timeout() }
}

impl Default for DiscoveryConfig {
  fn default() -> Self {
    Self { limits: DiscoverySettings::default(), scheme: "https".to_owned() }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state for the auth middleware.
pub struct AppState<S, F> {
  pub store:   Arc<S>,
  pub service: Arc<PeopleService<S, F>>,
  pub auth:    Arc<AuthConfig>,
}

impl<S, F> Clone for AppState<S, F> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      service: self.service.clone(),
      auth:    self.auth.clone(),
    }
  }
}

impl<S, F> AppState<S, F>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  pub fn new(store: Arc<S>, client: Arc<F>, config: &ServerConfig) -> Self {
    let service = PeopleService::new(
      store.clone(),
      client,
      config.people.clone(),
      &config.discovery.limits,
    );
    Self {
      store,
      service: Arc::new(service),
      auth: Arc::new(AuthConfig {
        username:      config.auth_username.clone(),
        password_hash: config.auth_password_hash.clone(),
      }),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's axum [`Router`].
pub fn router<S, F>(state: AppState<S, F>) -> Router
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  kinfolk_api::api_router(state.service.clone())
    .layer(middleware::from_fn_with_state(state, authenticate::<S, F>))
    .layer(TraceLayer::new_for_http())
}
