//! HTTP Basic auth and the middleware that turns it into a viewer.
//!
//! The node serves one local account. A request carrying valid credentials
//! for it is signed in as that account's person; a request with no
//! `Authorization` header is anonymous; bad credentials are rejected.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use kinfolk_api::CurrentViewer;
use kinfolk_core::{
  federation::FederationClient,
  person::Viewer,
  store::{IdentityStore, Store},
};
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Hash `password` into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verify Basic credentials from headers.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

/// The viewer for a request: `None` without credentials, the configured
/// account's person with valid ones.
pub async fn resolve_viewer<S, F>(
  headers: &HeaderMap,
  state: &AppState<S, F>,
) -> Result<Option<Viewer>, Error>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  if !headers.contains_key(header::AUTHORIZATION) {
    return Ok(None);
  }
  verify_auth(headers, &state.auth)?;

  let person = state
    .store
    .find_by_username(&state.auth.username)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or_else(|| Error::AccountMissing(state.auth.username.clone()))?;
  Ok(Some(Viewer::new(person)))
}

/// Middleware inserting a [`CurrentViewer`] into every request.
pub async fn authenticate<S, F>(
  State(state): State<AppState<S, F>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let viewer = resolve_viewer(req.headers(), &state).await;
  match viewer {
    Ok(viewer) => {
      req.extensions_mut().insert(CurrentViewer(viewer));
      next.run(req).await
    }
    Err(e) => e.into_response(),
  }
}
