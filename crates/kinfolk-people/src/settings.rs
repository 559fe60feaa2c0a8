//! Tunables for the people services, deserialised from the `[people]` and
//! `[discovery]` config sections.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeopleSettings {
  /// Default result count for a search.
  pub search_page_size:   u32,
  /// Contacts and photos embedded in a profile.
  pub profile_preview:    u32,
  pub contacts_page_size: u32,
  /// Default post count for a profile stream.
  pub stream_page_size:   u32,
}

impl Default for PeopleSettings {
  fn default() -> Self {
    Self {
      search_page_size:   15,
      profile_preview:    8,
      contacts_page_size: 15,
      stream_page_size:   15,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
  /// Upper bound on one discovery, from enqueue to persisted record.
  pub timeout_secs:   u64,
  /// Discoveries allowed to run at the same time.
  pub max_concurrent: usize,
}

impl DiscoverySettings {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

impl Default for DiscoverySettings {
  fn default() -> Self { Self { timeout_secs: 30, max_concurrent: 4 } }
}
