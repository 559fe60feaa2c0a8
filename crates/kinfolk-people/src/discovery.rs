//! Deduplicated background discovery of remote handles.
//!
//! A search for an unknown handle must not block on the network. Instead a
//! ticket is taken for the normalized handle and the lookup runs on a
//! detached task. At most one ticket exists per handle; a second request
//! while the first is in flight is answered with
//! [`DiscoveryRequest::AlreadyPending`]. The caller never receives the
//! discovered record: it lands in the [`IdentityStore`] and shows up in a
//! later search.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use kinfolk_core::{
  federation::FederationClient,
  person::PersonRef,
  query::normalize_handle,
  store::IdentityStore,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::settings::DiscoverySettings;

/// Why a discovery was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOrigin {
  /// A handle search found nothing locally.
  Search,
  /// An explicit retrieve-remote call.
  Explicit,
}

/// Outcome of [`RemoteResolver::request_discovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryRequest {
  Enqueued,
  AlreadyPending,
}

/// Failures of a background discovery. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum DiscoveryError {
  #[error("discovery timed out after {0:?}")]
  Timeout(Duration),

  #[error("federation client error: {0}")]
  Client(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

type Tickets = Arc<Mutex<HashSet<String>>>;

/// A held ticket for one handle. Released on drop, including when the
/// discovery task panics or is cancelled by its timeout.
struct Ticket {
  handle:  String,
  tickets: Tickets,
}

impl Drop for Ticket {
  fn drop(&mut self) {
    self
      .tickets
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.handle);
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Runs remote discovery on detached tasks, one ticket per handle.
pub struct RemoteResolver<S, F> {
  store:   Arc<S>,
  client:  Arc<F>,
  tickets: Tickets,
  permits: Arc<Semaphore>,
  timeout: Duration,
}

impl<S, F> Clone for RemoteResolver<S, F> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      client:  self.client.clone(),
      tickets: self.tickets.clone(),
      permits: self.permits.clone(),
      timeout: self.timeout,
    }
  }
}

impl<S, F> RemoteResolver<S, F>
where
  S: IdentityStore + 'static,
  F: FederationClient + 'static,
{
  /// `timeout` covers waiting for a permit, the network call and storing
  /// the result.
  pub fn new(
    store: Arc<S>,
    client: Arc<F>,
    timeout: Duration,
    max_concurrent: usize,
  ) -> Self {
    Self {
      store,
      client,
      tickets: Arc::default(),
      permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
      timeout,
    }
  }

  pub fn from_settings(
    store: Arc<S>,
    client: Arc<F>,
    settings: &DiscoverySettings,
  ) -> Self {
    Self::new(store, client, settings.timeout(), settings.max_concurrent)
  }

  /// Enqueue discovery of `handle` unless a ticket for it is already held.
  ///
  /// Must be called from within a tokio runtime.
  pub fn request_discovery(
    &self,
    handle: &str,
    origin: DiscoveryOrigin,
  ) -> DiscoveryRequest {
    let handle = normalize_handle(handle);
    let Some(ticket) = self.try_take(&handle) else {
      debug!(%handle, ?origin, "discovery already pending");
      return DiscoveryRequest::AlreadyPending;
    };
    info!(%handle, ?origin, "enqueued remote discovery");

    let store   = self.store.clone();
    let client  = self.client.clone();
    let permits = self.permits.clone();
    let limit   = self.timeout;

    tokio::spawn(async move {
      let _ticket = ticket;
      let run = discover(&*store, &*client, &permits, &handle);
      let outcome = match tokio::time::timeout(limit, run).await {
        Ok(result) => result,
        Err(_) => Err(DiscoveryError::Timeout(limit)),
      };
      match outcome {
        Ok(person) => {
          info!(%handle, guid = %person.guid, "remote discovery finished")
        }
        Err(e) => warn!(%handle, error = %e, "remote discovery failed"),
      }
    });

    DiscoveryRequest::Enqueued
  }

  /// Whether a discovery for `handle` is in flight.
  pub fn is_pending(&self, handle: &str) -> bool {
    self.lock().contains(&normalize_handle(handle))
  }

  pub fn pending_count(&self) -> usize { self.lock().len() }

  fn try_take(&self, handle: &str) -> Option<Ticket> {
    let inserted = self.lock().insert(handle.to_owned());
    inserted.then(|| Ticket {
      handle:  handle.to_owned(),
      tickets: self.tickets.clone(),
    })
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
    self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

async fn discover<S, F>(
  store: &S,
  client: &F,
  permits: &Semaphore,
  handle: &str,
) -> Result<PersonRef, DiscoveryError>
where
  S: IdentityStore,
  F: FederationClient,
{
  // Never closed; an error here would mean the runtime is going away.
  let _permit = permits
    .acquire()
    .await
    .map_err(|e| DiscoveryError::Client(Box::new(e)))?;
  let found = client
    .discover(handle)
    .await
    .map_err(|e| DiscoveryError::Client(Box::new(e)))?;
  store
    .record_discovered(found)
    .await
    .map_err(|e| DiscoveryError::Store(Box::new(e)))
}
