//! Handlers for a person's contacts and the viewer's aspects.
//!
//! Both look the person up by guid only and require a signed-in viewer.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kinfolk_core::{
  contact::AspectMembership,
  federation::FederationClient,
  store::Store,
};
use kinfolk_people::{PeopleService, service::ContactsListing};
use serde::Deserialize;

use crate::{error::ApiError, viewer::RequireViewer};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

/// `GET /people/{id}/contacts[?page=<n>][&limit=<n>]`
///
/// Strangers get an empty listing, not an error.
pub async fn list<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  RequireViewer(viewer): RequireViewer,
  Path(guid): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<ContactsListing>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let listing = service
    .contacts(&viewer, &guid, params.page, params.limit)
    .await?;
  Ok(Json(listing))
}

/// `GET /people/{id}/aspect_membership`
pub async fn aspect_membership<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  RequireViewer(viewer): RequireViewer,
  Path(guid): Path<String>,
) -> Result<Json<AspectMembership>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  Ok(Json(service.aspect_membership(&viewer, &guid).await?))
}
