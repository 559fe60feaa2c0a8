//! WebFinger (RFC 7033) discovery of remote persons.
//!
//! `user@domain` is resolved by fetching
//! `<scheme>://domain/.well-known/webfinger?resource=acct:user@domain` and
//! reading the JRD document. The person's guid comes from the
//! `http://joindiaspora.com/guid` link (or property of the same name).

use std::{collections::HashMap, time::Duration};

use kinfolk_core::{federation::FederationClient, person::DiscoveredPerson};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const GUID_REL: &str = "http://joindiaspora.com/guid";
pub const PROFILE_PAGE_REL: &str = "http://webfinger.net/rel/profile-page";
pub const NAME_PROPERTY: &str = "http://schema.org/name";

#[derive(Debug, Error)]
pub enum WebfingerError {
  #[error("not a user@domain handle: {0}")]
  InvalidHandle(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} answered {status}")]
  Status { url: String, status: StatusCode },

  #[error("webfinger document for {0} carries no guid")]
  MissingGuid(String),
}

// ─── JRD ─────────────────────────────────────────────────────────────────────

/// A JSON Resource Descriptor, as served by `/.well-known/webfinger`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Jrd {
  pub subject:    Option<String>,
  #[serde(default)]
  pub aliases:    Vec<String>,
  #[serde(default)]
  pub properties: HashMap<String, Option<String>>,
  #[serde(default)]
  pub links:      Vec<JrdLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JrdLink {
  pub rel:  String,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub href: Option<String>,
}

impl Jrd {
  /// `href` of the first link with relation `rel`.
  pub fn link(&self, rel: &str) -> Option<&str> {
    self
      .links
      .iter()
      .find(|l| l.rel == rel)
      .and_then(|l| l.href.as_deref())
  }

  pub fn property(&self, name: &str) -> Option<&str> {
    self.properties.get(name).and_then(|v| v.as_deref())
  }

  /// Build the person record for `handle` from this document.
  pub fn into_person(self, handle: &str) -> Result<DiscoveredPerson, WebfingerError> {
    let guid = self
      .link(GUID_REL)
      .or_else(|| self.property(GUID_REL))
      .filter(|g| !g.is_empty())
      .ok_or_else(|| WebfingerError::MissingGuid(handle.to_owned()))?
      .to_owned();

    Ok(DiscoveredPerson {
      guid,
      handle:       handle.to_lowercase(),
      display_name: self.property(NAME_PROPERTY).map(str::to_owned),
      profile_url:  self.link(PROFILE_PAGE_REL).map(str::to_owned),
    })
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// [`FederationClient`] over WebFinger.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WebfingerClient {
  client: Client,
  scheme: String,
}

impl WebfingerClient {
  /// `scheme` is `https` in production; `http` is useful against local
  /// test pods.
  pub fn new(scheme: &str, timeout: Duration) -> Result<Self, WebfingerError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, scheme: scheme.to_owned() })
  }

  /// The WebFinger endpoint for `handle`'s domain.
  pub fn endpoint(&self, handle: &str) -> Result<String, WebfingerError> {
    let domain = match handle.split_once('@') {
      Some((user, domain)) if !user.is_empty() && !domain.is_empty() => domain,
      _ => return Err(WebfingerError::InvalidHandle(handle.to_owned())),
    };
    Ok(format!("{}://{domain}/.well-known/webfinger", self.scheme))
  }
}

impl FederationClient for WebfingerClient {
  type Error = WebfingerError;

  async fn discover(&self, handle: &str) -> Result<DiscoveredPerson, WebfingerError> {
    let url = self.endpoint(handle)?;
    debug!(%url, handle, "webfinger lookup");

    let resp = self
      .client
      .get(&url)
      .query(&[("resource", format!("acct:{handle}"))])
      .header(header::ACCEPT, "application/jrd+json, application/json")
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(WebfingerError::Status { url, status: resp.status() });
    }

    let jrd: Jrd = resp.json().await?;
    jrd.into_person(handle)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(doc: &str) -> Jrd { serde_json::from_str(doc).unwrap() }

  #[test]
  fn guid_from_link() {
    let jrd = parse(
      r#"{
        "subject": "acct:bob@remote.example",
        "aliases": ["https://remote.example/people/abc123"],
        "links": [
          {"rel": "http://joindiaspora.com/guid", "type": "text/html", "href": "abc123"},
          {"rel": "http://webfinger.net/rel/profile-page", "type": "text/html",
           "href": "https://remote.example/u/bob"}
        ]
      }"#,
    );
    let person = jrd.into_person("Bob@Remote.Example").unwrap();
    assert_eq!(person.guid, "abc123");
    assert_eq!(person.handle, "bob@remote.example");
    assert_eq!(person.profile_url.as_deref(), Some("https://remote.example/u/bob"));
    assert!(person.display_name.is_none());
  }

  #[test]
  fn guid_and_name_from_properties() {
    let jrd = parse(
      r#"{
        "subject": "acct:carol@remote.example",
        "properties": {
          "http://joindiaspora.com/guid": "c4r0l",
          "http://schema.org/name": "Carol",
          "http://example.org/unset": null
        }
      }"#,
    );
    let person = jrd.into_person("carol@remote.example").unwrap();
    assert_eq!(person.guid, "c4r0l");
    assert_eq!(person.display_name.as_deref(), Some("Carol"));
    assert!(person.profile_url.is_none());
  }

  #[test]
  fn missing_guid_is_an_error() {
    let jrd = parse(r#"{"subject": "acct:x@remote.example", "links": []}"#);
    assert!(matches!(
      jrd.into_person("x@remote.example"),
      Err(WebfingerError::MissingGuid(_))
    ));
  }

  #[test]
  fn endpoint_uses_the_handle_domain() {
    let client = WebfingerClient::new("https", Duration::from_secs(5)).unwrap();
    assert_eq!(
      client.endpoint("bob@remote.example:3000").unwrap(),
      "https://remote.example:3000/.well-known/webfinger"
    );
    assert!(matches!(client.endpoint("@remote.example"), Err(WebfingerError::InvalidHandle(_))));
    assert!(matches!(client.endpoint("bob@"), Err(WebfingerError::InvalidHandle(_))));
    assert!(matches!(client.endpoint("bob"), Err(WebfingerError::InvalidHandle(_))));
  }
}
