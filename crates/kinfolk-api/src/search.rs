//! Handlers for people search and remote discovery.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/people` | `?q=<query>[&limit=][&page=]`; sign-in required |
//! | `GET`  | `/people/refresh_search` | `?q=<handle>`; exact matches only |
//! | `POST` | `/people/retrieve_remote` | Body: `{"handle":"user@domain"}`; 202 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kinfolk_core::{federation::FederationClient, store::Store};
use kinfolk_people::{
  PeopleService,
  service::{SearchPage, SearchRefresh},
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::ApiError, viewer::RequireViewer};

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  #[serde(default)]
  pub q:     String,
  pub limit: Option<u32>,
  pub page:  Option<u32>,
}

/// `GET /people?q=<query>[&limit=<n>][&page=<n>]`
///
/// A handle with no local match answers with no people and
/// `pending_discovery` set; search again later.
pub async fn search<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  RequireViewer(viewer): RequireViewer,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let page = service
    .search(&viewer, &params.q, params.limit, params.page)
    .await?;
  Ok(Json(page))
}

// ─── Refresh ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct RefreshParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /people/refresh_search?q=<handle>`
pub async fn refresh<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  RequireViewer(viewer): RequireViewer,
  Query(params): Query<RefreshParams>,
) -> Result<Json<SearchRefresh>, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  Ok(Json(service.refresh_search(&viewer, &params.q).await?))
}

// ─── Retrieve remote ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct RetrieveRemoteBody {
  pub handle: Option<String>,
}

/// `POST /people/retrieve_remote`, body: `{"handle":"user@domain"}`
pub async fn retrieve_remote<S, F>(
  State(service): State<Arc<PeopleService<S, F>>>,
  RequireViewer(_viewer): RequireViewer,
  Json(body): Json<RetrieveRemoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  let outcome = service.request_remote_discovery(body.handle.as_deref())?;
  Ok((StatusCode::ACCEPTED, Json(json!({ "status": outcome }))))
}
