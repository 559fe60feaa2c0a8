//! Extractors for the signed-in viewer.
//!
//! Authentication happens outside this crate. Whatever authenticates the
//! request inserts a [`CurrentViewer`] into the request extensions; a
//! request without one is anonymous.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use kinfolk_core::person::Viewer;

use crate::error::ApiError;

/// The viewer, if the request is signed in.
#[derive(Debug, Clone, Default)]
pub struct CurrentViewer(pub Option<Viewer>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentViewer {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
    Ok(parts.extensions.get::<CurrentViewer>().cloned().unwrap_or_default())
  }
}

/// A signed-in viewer; anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct RequireViewer(pub Viewer);

impl<S: Send + Sync> FromRequestParts<S> for RequireViewer {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Ok(CurrentViewer(viewer)) = CurrentViewer::from_request_parts(parts, state).await;
    viewer.map(RequireViewer).ok_or(ApiError::Unauthenticated)
  }
}
