//! Handlers for profile views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/people/{id}` | guid, or username via `id` or `?username=` |
//! | `GET`  | `/u/{username}` | |
//! | `GET`  | `/people/{id}/hovercard` | sign-in required |
//! | `GET`  | `/people/{id}/stream` | `?max_time=<rfc3339>[&limit=]` |
//! | `GET`  | `/people/{id}/last_post` | 404 if nothing visible |
//!
//! Closed accounts answer 410; remote profiles need a signed-in viewer.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use kinfolk_core::{
  contact::PersonCard,
  federation::FederationClient,
  media::Post,
  person::PersonLookup,
  store::Store,
};
use kinfolk_people::{PeopleService, ProfileAggregate};
use serde::Deserialize;

use crate::{
  error::ApiError,
  viewer::{CurrentViewer, RequireViewer},
};

#[derive(Debug, Deserialize, Default)]
pub struct ShowParams {
  pub username: Option<String>,
}

/// `GET /people/{id}[?username=<name>]`
pub async fn show<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  CurrentViewer(viewer): CurrentViewer,
  Path(id): Path<String>,
  Query(params): Query<ShowParams>,
) -> Result<Json<ProfileAggregate>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let lookup = PersonLookup { id: Some(id), username: params.username };
  Ok(Json(service.view_profile(&lookup, viewer.as_ref()).await?))
}

/// `GET /u/{username}`
pub async fn by_username<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  CurrentViewer(viewer): CurrentViewer,
  Path(username): Path<String>,
) -> Result<Json<ProfileAggregate>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let lookup = PersonLookup::username(username);
  Ok(Json(service.view_profile(&lookup, viewer.as_ref()).await?))
}

/// `GET /people/{id}/hovercard`
pub async fn hovercard<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  RequireViewer(viewer): RequireViewer,
  Path(id): Path<String>,
) -> Result<Json<PersonCard>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let card = service.hovercard(&PersonLookup::guid(id), &viewer).await?;
  Ok(Json(card))
}

#[derive(Debug, Deserialize, Default)]
pub struct StreamParams {
  pub max_time: Option<DateTime<Utc>>,
  pub limit:    Option<u32>,
}

/// `GET /people/{id}/stream[?max_time=<rfc3339>][&limit=<n>]`
pub async fn stream<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  CurrentViewer(viewer): CurrentViewer,
  Path(id): Path<String>,
  Query(params): Query<StreamParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let posts = service
    .stream(&PersonLookup::guid(id), viewer.as_ref(), params.max_time, params.limit)
    .await?;
  Ok(Json(posts))
}

/// `GET /people/{id}/last_post`
pub async fn last_post<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  CurrentViewer(viewer): CurrentViewer,
  Path(id): Path<String>,
) -> Result<Json<Post>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let post = service.last_post(&PersonLookup::guid(id), viewer.as_ref()).await?;
  Ok(Json(post))
}
