//! What a viewer may see of another person's contacts.
//!
//! Visibility is derived from the directed contact graph. The viewer sees
//! all of their own contacts. For anyone else the viewer sees nothing
//! unless they have an edge to the target, and then only the members of
//! the target's `contacts_visible` aspects that include the viewer.

use std::{collections::HashMap, sync::Arc};

use kinfolk_core::{
  Error, Result,
  contact::{AspectBinding, AspectMembership, ContactEdge, PersonCard},
  page::{Page, Paginated},
  person::{PersonRef, Viewer},
  store::ContactStore,
};
use uuid::Uuid;

/// Whose contacts a listing draws from.
enum Scope {
  /// The viewer is looking at themselves.
  Own,
  /// The target's contacts shared with the viewer.
  SharedBy(Uuid),
  Stranger,
}

pub struct VisibilityGraph<S> {
  store: Arc<S>,
}

impl<S> Clone for VisibilityGraph<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: ContactStore> VisibilityGraph<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// The viewer's edge to `person`, if any.
  pub async fn contact_for(
    &self,
    viewer: &Viewer,
    person: &PersonRef,
  ) -> Result<Option<ContactEdge>> {
    self
      .store
      .edge_for(viewer.person_id(), person.person_id)
      .await
      .map_err(Error::store)
  }

  async fn scope(&self, viewer: &Viewer, person: &PersonRef) -> Result<Scope> {
    if viewer.is(person) {
      return Ok(Scope::Own);
    }
    Ok(match self.contact_for(viewer, person).await? {
      Some(_) => Scope::SharedBy(person.person_id),
      None => Scope::Stranger,
    })
  }

  /// One page of the contacts of `person` visible to `viewer`. Strangers
  /// get an empty page, never an error.
  pub async fn contacts_of_contact(
    &self,
    viewer: &Viewer,
    person: &PersonRef,
    page: Page,
  ) -> Result<Paginated<PersonRef>> {
    let me = viewer.person_id();
    let (items, total_count) = match self.scope(viewer, person).await? {
      Scope::Own => (
        self.store.contacts_of(me, page).await,
        self.store.count_contacts_of(me).await,
      ),
      Scope::SharedBy(owner) => (
        self.store.shared_contacts_of(owner, me, page).await,
        self.store.count_shared_contacts_of(owner, me).await,
      ),
      Scope::Stranger => return Ok(Paginated::empty(page)),
    };

    Ok(Paginated {
      items:       items.map_err(Error::store)?,
      total_count: total_count.map_err(Error::store)?,
      page:        page.number,
      per_page:    page.size,
    })
  }

  /// The total a full [`VisibilityGraph::contacts_of_contact`] listing
  /// would report.
  pub async fn count_contacts_of_contact(
    &self,
    viewer: &Viewer,
    person: &PersonRef,
  ) -> Result<u64> {
    let me = viewer.person_id();
    let count = match self.scope(viewer, person).await? {
      Scope::Own => self.store.count_contacts_of(me).await,
      Scope::SharedBy(owner) => self.store.count_shared_contacts_of(owner, me).await,
      Scope::Stranger => return Ok(0),
    };
    count.map_err(Error::store)
  }

  /// Pair each person with the viewer's edge to them, in one store call.
  pub async fn cards_for(
    &self,
    viewer: Option<&Viewer>,
    people: Vec<PersonRef>,
  ) -> Result<Vec<PersonCard>> {
    let Some(viewer) = viewer else {
      let cards = people.into_iter().map(|person| PersonCard { person, contact: None });
      return Ok(cards.collect());
    };

    let ids: Vec<Uuid> = people.iter().map(|p| p.person_id).collect();
    let mut edges: HashMap<Uuid, ContactEdge> = self
      .store
      .edges_for(viewer.person_id(), &ids)
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|e| (e.person_id, e))
      .collect();

    Ok(
      people
        .into_iter()
        .map(|person| {
          let contact = edges.remove(&person.person_id);
          PersonCard { person, contact }
        })
        .collect(),
    )
  }

  /// The viewer's aspects flagged by whether `person` is in them.
  pub async fn aspect_bindings(
    &self,
    viewer: &Viewer,
    person: &PersonRef,
  ) -> Result<AspectMembership> {
    if viewer.is(person) {
      return Ok(AspectMembership::ThatsYou);
    }

    let contact = self.contact_for(viewer, person).await?;
    let aspects = self
      .store
      .aspects_of(viewer.person_id())
      .await
      .map_err(Error::store)?;

    let bindings = aspects
      .into_iter()
      .map(|a| AspectBinding {
        member:    contact.as_ref().is_some_and(|c| c.in_aspect(a.aspect_id)),
        aspect_id: a.aspect_id,
        name:      a.name,
      })
      .collect();

    Ok(AspectMembership::Contact { person: person.clone(), contact, bindings })
  }
}
