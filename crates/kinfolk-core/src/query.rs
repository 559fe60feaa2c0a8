//! Search-query classification.
//!
//! A query that looks like a federated handle (`user@domain`) is looked up
//! by exact handle and may bootstrap remote discovery; anything else is
//! free text. The handle pattern is intentionally loose: any word
//! characters, an `@`, then any run of domain characters. Strings such as
//! `"@"`, `"bob@"` and `"bob@example.org."` are all handle-like.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `^\w*@[A-Za-z0-9.:-]*$` with an ASCII `\w`, anchored to the whole string.
static HANDLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z0-9_]*@[A-Za-z0-9.:-]*$")
    .expect("Invalid regex pattern for handle classification")
});

/// Whether a query is looked up as a handle or as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
  HandleLike,
  FreeText,
}

/// A raw search string, captured once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  raw: String,
}

impl SearchQuery {
  pub fn new(raw: impl Into<String>) -> Self { Self { raw: raw.into() } }

  pub fn as_str(&self) -> &str { &self.raw }

  pub fn is_blank(&self) -> bool { self.raw.trim().is_empty() }

  pub fn kind(&self) -> QueryKind {
    if is_handle_like(&self.raw) {
      QueryKind::HandleLike
    } else {
      QueryKind::FreeText
    }
  }

  pub fn is_handle_like(&self) -> bool { self.kind() == QueryKind::HandleLike }

  /// The lowercased query, as compared against stored handles and used as
  /// the discovery dedup key.
  pub fn normalized(&self) -> String { normalize_handle(&self.raw) }
}

impl From<&str> for SearchQuery {
  fn from(s: &str) -> Self { Self::new(s) }
}

pub fn is_handle_like(s: &str) -> bool { HANDLE_PATTERN.is_match(s) }

/// Trim and lowercase a handle.
pub fn normalize_handle(s: &str) -> String { s.trim().to_lowercase() }
