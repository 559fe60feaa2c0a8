//! The transport used to discover persons on remote nodes.

use std::future::Future;

use crate::person::DiscoveredPerson;

/// Resolves a remote handle into a person record.
///
/// Implementations perform network I/O and may fail or hang; callers are
/// expected to bound them with a timeout.
pub trait FederationClient: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn discover<'a>(
    &'a self,
    handle: &'a str,
  ) -> impl Future<Output = Result<DiscoveredPerson, Self::Error>> + Send + 'a;
}
