//! People resolution services for Kinfolk.
//!
//! Everything here is generic over the storage traits in
//! [`kinfolk_core::store`] and the [`kinfolk_core::federation`] transport.
//! [`PeopleService`] bundles the individual components behind the
//! operations the HTTP layer exposes:
//!
//! - [`IdentityResolver`] turns lookups and search queries into persons.
//! - [`VisibilityGraph`] answers what a viewer may see of a person's
//!   contacts.
//! - [`RemoteResolver`] runs deduplicated background discovery of remote
//!   handles.
//! - [`AggregateComposer`] assembles profile views.
//! - [`NotificationSweeper`] clears notifications about a viewed person.

pub mod discovery;
pub mod notifications;
pub mod profile;
pub mod resolver;
pub mod service;
pub mod settings;
pub mod visibility;

pub use discovery::{DiscoveryOrigin, DiscoveryRequest, RemoteResolver};
pub use notifications::NotificationSweeper;
pub use profile::{AggregateComposer, ProfileAggregate};
pub use resolver::{IdentityResolver, SearchResults};
pub use service::PeopleService;
pub use settings::{DiscoverySettings, PeopleSettings};
pub use visibility::VisibilityGraph;

#[cfg(test)]
mod tests;
