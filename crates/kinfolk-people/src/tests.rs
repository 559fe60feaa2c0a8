//! Service tests against the in-memory SQLite store and a scripted
//! federation client.

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Utc};
use kinfolk_core::{
  Error,
  contact::{Aspect, AspectMembership, ContactEdge, PersonCard},
  federation::FederationClient,
  media::{Photo, Post},
  notification::{NotificationRecord, PERSON_TARGET},
  page::{Page, Preview},
  person::{DiscoveredPerson, PersonLookup, PersonRef, Viewer},
  store::{ContactStore, IdentityStore, NotificationStore, PhotoStore, PostStore},
};
use kinfolk_store_sqlite::{NewPerson, SqliteStore};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::{
  DiscoveryRequest, DiscoverySettings, NotificationSweeper, PeopleService,
  PeopleSettings, RemoteResolver, VisibilityGraph,
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("no such handle: {0}")]
struct UnknownHandle(String);

/// Answers discovery from a fixed directory. With a gate, every call waits
/// for a permit before answering.
#[derive(Default)]
struct ScriptedFederation {
  directory: HashMap<String, DiscoveredPerson>,
  calls:     AtomicUsize,
  gate:      Option<Arc<Semaphore>>,
}

impl ScriptedFederation {
  fn knowing(handles: &[&str]) -> Self {
    let directory = handles
      .iter()
      .map(|h| {
        let person = DiscoveredPerson {
          guid:         format!("guid-{h}"),
          handle:       (*h).to_owned(),
          display_name: None,
          profile_url:  Some(format!("https://{}/", h.split('@').nth(1).unwrap_or_default())),
        };
        ((*h).to_owned(), person)
      })
      .collect();
    Self { directory, ..Self::default() }
  }

  fn gated(mut self, gate: Arc<Semaphore>) -> Self {
    self.gate = Some(gate);
    self
  }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl FederationClient for ScriptedFederation {
  type Error = UnknownHandle;

  async fn discover(&self, handle: &str) -> Result<DiscoveredPerson, UnknownHandle> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(gate) = &self.gate {
      let _permit = gate.acquire().await;
    }
    self
      .directory
      .get(handle)
      .cloned()
      .ok_or_else(|| UnknownHandle(handle.to_owned()))
  }
}

struct Fixture {
  store:   Arc<SqliteStore>,
  client:  Arc<ScriptedFederation>,
  service: PeopleService<SqliteStore, ScriptedFederation>,
}

impl Fixture {
  async fn new(client: ScriptedFederation) -> Self {
    Self::with_timeout(client, Duration::from_secs(5)).await
  }

  async fn with_timeout(client: ScriptedFederation, timeout: Duration) -> Self {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let client = Arc::new(client);
    let remote = RemoteResolver::new(store.clone(), client.clone(), timeout, 2);
    let service =
      PeopleService::with_remote(store.clone(), remote, PeopleSettings::default());
    Self { store, client, service }
  }

  async fn local(&self, username: &str) -> PersonRef {
    self
      .store
      .add_person(NewPerson::local(username, "pod.example"))
      .await
      .unwrap()
  }

  async fn viewer(&self, username: &str) -> Viewer { Viewer::new(self.local(username).await) }

  fn remote(&self) -> &RemoteResolver<SqliteStore, ScriptedFederation> {
    self.service.remote()
  }

  /// Wait for an in-flight discovery of `handle` to release its ticket.
  async fn settle(&self, handle: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
      while self.remote().is_pending(handle) {
        tokio::time::sleep(Duration::from_millis(5)).await;
      }
    })
    .await
    .expect("discovery should settle");
  }
}

fn handles(people: &[PersonCard]) -> Vec<&str> {
  people.iter().map(|c| c.person.handle.as_str()).collect()
}

// ─── Search and discovery ────────────────────────────────────────────────────

#[tokio::test]
async fn handle_search_miss_enqueues_one_discovery() {
  let gate = Arc::new(Semaphore::new(0));
  let fx = Fixture::new(
    ScriptedFederation::knowing(&["bob@remote.example"]).gated(gate.clone()),
  )
  .await;
  let viewer = fx.viewer("alice").await;

  let first = fx.service.search(&viewer, "Bob@Remote.Example", None, None).await.unwrap();
  assert!(first.people.is_empty());
  assert_eq!(first.pending_discovery.as_deref(), Some("bob@remote.example"));
  assert!(fx.remote().is_pending("bob@remote.example"));

  let second = fx.service.search(&viewer, "bob@remote.example", None, None).await.unwrap();
  assert!(second.people.is_empty());
  assert_eq!(fx.remote().pending_count(), 1);

  gate.add_permits(10);
  fx.settle("bob@remote.example").await;
  assert_eq!(fx.client.calls(), 1);

  let found = fx.service.search(&viewer, "bob@remote.example", None, None).await.unwrap();
  assert_eq!(handles(&found.people), vec!["bob@remote.example"]);
  assert!(found.people[0].person.remote);
  assert!(found.pending_discovery.is_none());
}

#[tokio::test]
async fn free_text_search_never_discovers() {
  let fx = Fixture::new(ScriptedFederation::knowing(&["bob@remote.example"])).await;
  let viewer = fx.viewer("alice").await;

  let results = fx.service.search(&viewer, "bob", None, None).await.unwrap();
  assert!(results.people.is_empty());
  assert!(results.pending_discovery.is_none());
  assert_eq!(fx.remote().pending_count(), 0);
  assert_eq!(fx.client.calls(), 0);
}

#[tokio::test]
async fn exact_handle_match_comes_first() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let viewer = fx.viewer("viewer").await;
  // Older and also a prefix match, so free text alone would rank it first.
  fx.store.add_person(NewPerson::remote("sam@pod.example.net")).await.unwrap();
  fx.local("sam").await;

  let results = fx.service.search(&viewer, "sam@pod.example", None, None).await.unwrap();
  assert_eq!(handles(&results.people), vec!["sam@pod.example", "sam@pod.example.net"]);

  let limited = fx.service.search(&viewer, "sam@pod.example", Some(1), None).await.unwrap();
  assert_eq!(handles(&limited.people), vec!["sam@pod.example"]);

  let second_page =
    fx.service.search(&viewer, "sam@pod.example", Some(1), Some(2)).await.unwrap();
  assert_eq!(handles(&second_page.people), vec!["sam@pod.example.net"]);
}

#[tokio::test]
async fn search_cards_carry_the_viewers_edge() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let viewer = fx.viewer("viewer").await;
  let friend = fx.local("samfriend").await;
  fx.local("samstranger").await;
  fx.store.add_contact(viewer.person_id(), friend.person_id, &[]).await.unwrap();

  let results = fx.service.search(&viewer, "sam", None, None).await.unwrap();
  assert_eq!(handles(&results.people), vec![
    "samfriend@pod.example",
    "samstranger@pod.example"
  ]);
  assert!(results.people[0].contact.is_some());
  assert!(results.people[1].contact.is_none());
}

#[tokio::test]
async fn refresh_search_reports_exact_matches_without_discovery() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let viewer = fx.viewer("viewer").await;
  fx.local("sam").await;

  let hit = fx.service.refresh_search(&viewer, "SAM@pod.example").await.unwrap();
  assert_eq!(hit.count, 1);
  assert_eq!(
    hit.first_match.map(|c| c.person.handle),
    Some("sam@pod.example".to_owned())
  );

  let miss = fx.service.refresh_search(&viewer, "nobody@remote.example").await.unwrap();
  assert_eq!(miss.count, 0);
  assert!(miss.first_match.is_none());
  assert_eq!(fx.remote().pending_count(), 0);
}

#[tokio::test]
async fn explicit_discovery_validates_the_handle() {
  let gate = Arc::new(Semaphore::new(0));
  let fx = Fixture::new(ScriptedFederation::default().gated(gate.clone())).await;

  for bad in [None, Some(""), Some("   "), Some("not a handle")] {
    let err = fx.service.request_remote_discovery(bad).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{bad:?} gave {err:?}");
  }

  let first = fx.service.request_remote_discovery(Some("carol@remote.example"));
  assert_eq!(first.unwrap(), DiscoveryRequest::Enqueued);
  let again = fx.service.request_remote_discovery(Some("Carol@Remote.Example"));
  assert_eq!(again.unwrap(), DiscoveryRequest::AlreadyPending);

  gate.add_permits(10);
  fx.settle("carol@remote.example").await;
}

#[tokio::test]
async fn failed_discovery_releases_the_ticket() {
  let fx = Fixture::new(ScriptedFederation::default()).await;

  let first = fx.service.request_remote_discovery(Some("ghost@remote.example"));
  assert_eq!(first.unwrap(), DiscoveryRequest::Enqueued);
  fx.settle("ghost@remote.example").await;

  let viewer = fx.viewer("viewer").await;
  let results = fx.service.search(&viewer, "ghost@remote.example", None, None).await.unwrap();
  assert!(results.people.is_empty());
  fx.settle("ghost@remote.example").await;
  assert_eq!(fx.client.calls(), 2);
}

#[tokio::test]
async fn timed_out_discovery_releases_the_ticket() {
  let gate = Arc::new(Semaphore::new(0));
  let fx = Fixture::with_timeout(
    ScriptedFederation::knowing(&["slow@remote.example"]).gated(gate),
    Duration::from_millis(50),
  )
  .await;

  let request = fx.service.request_remote_discovery(Some("slow@remote.example"));
  assert_eq!(request.unwrap(), DiscoveryRequest::Enqueued);
  fx.settle("slow@remote.example").await;

  let viewer = fx.viewer("viewer").await;
  let results = fx.service.refresh_search(&viewer, "slow@remote.example").await.unwrap();
  assert_eq!(results.count, 0);
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_falls_back_from_guid_to_username() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let alice = fx.local("alice").await;

  let by_guid = fx
    .service
    .view_profile(&PersonLookup::guid(alice.guid.clone()), None)
    .await
    .unwrap();
  assert_eq!(by_guid.person, alice);

  let by_id_as_username =
    fx.service.view_profile(&PersonLookup::guid("alice"), None).await.unwrap();
  assert_eq!(by_id_as_username.person, alice);

  let by_username =
    fx.service.view_profile(&PersonLookup::username("alice"), None).await.unwrap();
  assert_eq!(by_username.person, alice);
}

#[tokio::test]
async fn unknown_person_is_not_found() {
  let fx = Fixture::new(ScriptedFederation::default()).await;

  let err = fx
    .service
    .view_profile(&PersonLookup::guid("missing"), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  let err = fx.service.view_profile(&PersonLookup::default(), None).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn closed_account_is_signalled_distinctly() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let viewer = fx.viewer("viewer").await;
  let gone = fx.local("gone").await;
  fx.store.close_account(gone.person_id).await.unwrap();
  let lookup = PersonLookup::username("gone");

  let err = fx.service.view_profile(&lookup, Some(&viewer)).await.unwrap_err();
  assert!(matches!(err, Error::AccountClosed(_)));

  let err = fx.service.hovercard(&lookup, &viewer).await.unwrap_err();
  assert!(matches!(err, Error::AccountClosed(_)));

  let err = fx.service.stream(&lookup, None, None, None).await.unwrap_err();
  assert!(matches!(err, Error::AccountClosed(_)));
}

#[tokio::test]
async fn remote_profiles_need_a_viewer() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let viewer = fx.viewer("viewer").await;
  let remote = fx.store.add_person(NewPerson::remote("far@remote.example")).await.unwrap();
  fx.store.close_account(remote.person_id).await.unwrap();
  let lookup = PersonLookup::guid(remote.guid);

  // Authentication is checked before the closed-account check.
  let err = fx.service.view_profile(&lookup, None).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));

  let err = fx.service.view_profile(&lookup, Some(&viewer)).await.unwrap_err();
  assert!(matches!(err, Error::AccountClosed(_)));
}

// ─── Visibility ──────────────────────────────────────────────────────────────

/// `bob` shares a visible aspect with `alice`, `carol` and `dave`, and keeps
/// `erin` in a hidden one. `alice` has `bob` as a contact.
struct Circle {
  alice:   Viewer,
  friends: Uuid,
  bob:   PersonRef,
  carol: PersonRef,
  dave:  PersonRef,
  erin:  PersonRef,
}

async fn circle(fx: &Fixture) -> Circle {
  let alice = fx.viewer("alice").await;
  let bob = fx.local("bob").await;
  let carol = fx.local("carol").await;
  let dave = fx.local("dave").await;
  let erin = fx.local("erin").await;

  let friends = fx.store.add_aspect(bob.person_id, "friends", true).await.unwrap();
  let work = fx.store.add_aspect(bob.person_id, "work", false).await.unwrap();
  for p in [alice.person_id(), carol.person_id, dave.person_id] {
    fx.store.add_contact(bob.person_id, p, &[friends.aspect_id]).await.unwrap();
  }
  fx.store.add_contact(bob.person_id, erin.person_id, &[work.aspect_id]).await.unwrap();
  fx.store.add_contact(alice.person_id(), bob.person_id, &[]).await.unwrap();

  Circle { alice, friends: friends.aspect_id, bob, carol, dave, erin }
}

#[tokio::test]
async fn strangers_see_no_contacts() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  let graph = VisibilityGraph::new(fx.store.clone());
  let stranger = Viewer::new(c.erin.clone());

  // erin has no edge to bob even though bob has one to her.
  let listing = graph.contacts_of_contact(&stranger, &c.bob, Page::first(10)).await.unwrap();
  assert!(listing.items.is_empty());
  assert_eq!(listing.total_count, 0);
  assert_eq!(graph.count_contacts_of_contact(&stranger, &c.bob).await.unwrap(), 0);
}

#[tokio::test]
async fn shared_contacts_match_their_count() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  let graph = VisibilityGraph::new(fx.store.clone());

  let count = graph.count_contacts_of_contact(&c.alice, &c.bob).await.unwrap();
  assert_eq!(count, 2);

  let mut seen = Vec::new();
  for number in 1..=3 {
    let page = graph
      .contacts_of_contact(&c.alice, &c.bob, Page::new(number, 1))
      .await
      .unwrap();
    assert_eq!(page.total_count, count);
    seen.extend(page.items);
  }
  assert_eq!(seen, vec![c.carol, c.dave]);
}

#[tokio::test]
async fn own_contacts_include_unsorted_edges() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  let graph = VisibilityGraph::new(fx.store.clone());
  let as_bob = Viewer::new(c.bob.clone());

  let listing = graph.contacts_of_contact(&as_bob, &c.bob, Page::first(10)).await.unwrap();
  assert_eq!(listing.total_count, 4);
  assert_eq!(listing.items, vec![
    c.alice.person.clone(),
    c.carol.clone(),
    c.dave.clone(),
    c.erin.clone()
  ]);

  // alice's only edge has no aspects; it still counts.
  let mine = graph
    .contacts_of_contact(&c.alice, &c.alice.person, Page::first(10))
    .await
    .unwrap();
  assert_eq!(mine.items, vec![c.bob]);
}

#[tokio::test]
async fn contacts_listing_resolves_by_guid() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;

  let listing = fx.service.contacts(&c.alice, &c.bob.guid, None, None).await.unwrap();
  assert_eq!(listing.person, c.bob);
  assert!(listing.contact.is_some());
  assert_eq!(listing.contacts.total_count, 2);
  assert_eq!(listing.contacts.per_page, 15);

  let err = fx.service.contacts(&c.alice, "bob", None, None).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn aspect_membership_flags_the_viewers_aspects() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let alice = fx.viewer("alice").await;
  let bob = fx.local("bob").await;
  let close = fx.store.add_aspect(alice.person_id(), "close", true).await.unwrap();
  fx.store.add_aspect(alice.person_id(), "far", true).await.unwrap();
  fx.store
    .add_contact(alice.person_id(), bob.person_id, &[close.aspect_id])
    .await
    .unwrap();

  let me = fx.service.aspect_membership(&alice, &alice.person.guid).await.unwrap();
  assert_eq!(me, AspectMembership::ThatsYou);

  let AspectMembership::Contact { contact, bindings, .. } =
    fx.service.aspect_membership(&alice, &bob.guid).await.unwrap()
  else {
    panic!("expected a contact membership");
  };
  assert!(contact.is_some());
  let flags: Vec<(&str, bool)> = bindings.iter().map(|b| (b.name.as_str(), b.member)).collect();
  assert_eq!(flags, vec![("close", true), ("far", false)]);
}

#[tokio::test]
async fn guid_routes_refuse_closed_accounts() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  fx.store.close_account(c.bob.person_id).await.unwrap();

  let err = fx.service.contacts(&c.alice, &c.bob.guid, None, None).await.unwrap_err();
  assert!(matches!(err, Error::AccountClosed(_)));

  let err = fx.service.aspect_membership(&c.alice, &c.bob.guid).await.unwrap_err();
  assert!(matches!(err, Error::AccountClosed(_)));
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_profile_shows_public_photos_only() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  let friends = [c.friends];
  fx.store.add_photo(c.bob.person_id, "https://pod.example/public.jpg", true, &[]).await.unwrap();
  fx.store
    .add_photo(c.bob.person_id, "https://pod.example/friends.jpg", false, &friends)
    .await
    .unwrap();

  let anon = fx
    .service
    .view_profile(&PersonLookup::username("bob"), None)
    .await
    .unwrap();
  assert_eq!(anon.photos.count, 1);
  assert!(anon.contact.is_none());
  assert_eq!(anon.contacts.count, 0);
  assert!(anon.contacts.items.is_empty());

  let seen = fx
    .service
    .view_profile(&PersonLookup::username("bob"), Some(&c.alice))
    .await
    .unwrap();
  assert_eq!(seen.photos.count, 2);
  assert_eq!(seen.photos.items[0].url, "https://pod.example/friends.jpg");
  assert!(seen.contact.is_some());
  assert_eq!(seen.contacts.count, 2);
  let names: Vec<&str> = seen.contacts.items.iter().map(|c| c.person.handle.as_str()).collect();
  assert_eq!(names, vec!["carol@pod.example", "dave@pod.example"]);
}

/// Delegates to SQLite except for photos, which always fail.
struct PhotosOffline(Arc<SqliteStore>);

#[derive(Debug, thiserror::Error)]
enum OfflineError {
  #[error(transparent)]
  Store(#[from] kinfolk_store_sqlite::Error),
  #[error("photo backend offline")]
  Photos,
}

impl IdentityStore for PhotosOffline {
  type Error = OfflineError;

  async fn find_by_guid(&self, guid: &str) -> Result<Option<PersonRef>, OfflineError> {
    Ok(self.0.find_by_guid(guid).await?)
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<PersonRef>, OfflineError> {
    Ok(self.0.find_by_username(username).await?)
  }

  async fn find_by_handle(&self, handle: &str) -> Result<Option<PersonRef>, OfflineError> {
    Ok(self.0.find_by_handle(handle).await?)
  }

  async fn search_people(
    &self,
    text: &str,
    viewer_id: Option<Uuid>,
    limit: usize,
  ) -> Result<Vec<PersonRef>, OfflineError> {
    Ok(self.0.search_people(text, viewer_id, limit).await?)
  }

  async fn record_discovered(&self, person: DiscoveredPerson) -> Result<PersonRef, OfflineError> {
    Ok(self.0.record_discovered(person).await?)
  }
}

impl ContactStore for PhotosOffline {
  type Error = OfflineError;

  async fn edge_for(
    &self,
    owner_id: Uuid,
    person_id: Uuid,
  ) -> Result<Option<ContactEdge>, OfflineError> {
    Ok(self.0.edge_for(owner_id, person_id).await?)
  }

  async fn edges_for(
    &self,
    owner_id: Uuid,
    person_ids: &[Uuid],
  ) -> Result<Vec<ContactEdge>, OfflineError> {
    Ok(self.0.edges_for(owner_id, person_ids).await?)
  }

  async fn contacts_of(&self, owner_id: Uuid, page: Page) -> Result<Vec<PersonRef>, OfflineError> {
    Ok(self.0.contacts_of(owner_id, page).await?)
  }

  async fn count_contacts_of(&self, owner_id: Uuid) -> Result<u64, OfflineError> {
    Ok(self.0.count_contacts_of(owner_id).await?)
  }

  async fn shared_contacts_of(
    &self,
    owner_id: Uuid,
    viewer_id: Uuid,
    page: Page,
  ) -> Result<Vec<PersonRef>, OfflineError> {
    Ok(self.0.shared_contacts_of(owner_id, viewer_id, page).await?)
  }

  async fn count_shared_contacts_of(
    &self,
    owner_id: Uuid,
    viewer_id: Uuid,
  ) -> Result<u64, OfflineError> {
    Ok(self.0.count_shared_contacts_of(owner_id, viewer_id).await?)
  }

  async fn aspects_of(&self, owner_id: Uuid) -> Result<Vec<Aspect>, OfflineError> {
    Ok(self.0.aspects_of(owner_id).await?)
  }
}

impl PhotoStore for PhotosOffline {
  type Error = OfflineError;

  async fn photos_for(
    &self,
    _author_id: Uuid,
    _viewer_id: Option<Uuid>,
    _page: Page,
  ) -> Result<Vec<Photo>, OfflineError> {
    Err(OfflineError::Photos)
  }

  async fn count_photos_for(
    &self,
    _author_id: Uuid,
    _viewer_id: Option<Uuid>,
  ) -> Result<u64, OfflineError> {
    Err(OfflineError::Photos)
  }
}

impl PostStore for PhotosOffline {
  type Error = OfflineError;

  async fn visible_posts_for(
    &self,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
    before: Option<DateTime<Utc>>,
    limit: usize,
  ) -> Result<Vec<Post>, OfflineError> {
    Ok(self.0.visible_posts_for(author_id, viewer_id, before, limit).await?)
  }
}

impl NotificationStore for PhotosOffline {
  type Error = OfflineError;

  async fn find_unread(
    &self,
    recipient_id: Uuid,
    target_type: &str,
    target_id: Uuid,
  ) -> Result<Vec<NotificationRecord>, OfflineError> {
    Ok(self.0.find_unread(recipient_id, target_type, target_id).await?)
  }

  async fn mark_read(&self, notification_id: Uuid) -> Result<(), OfflineError> {
    Ok(self.0.mark_read(notification_id).await?)
  }
}

#[tokio::test]
async fn failed_photo_fetch_leaves_the_preview_empty() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  fx.store.add_photo(c.bob.person_id, "https://pod.example/public.jpg", true, &[]).await.unwrap();

  let service = PeopleService::new(
    Arc::new(PhotosOffline(fx.store.clone())),
    fx.client.clone(),
    PeopleSettings::default(),
    &DiscoverySettings::default(),
  );
  let profile = service
    .view_profile(&PersonLookup::username("bob"), Some(&c.alice))
    .await
    .unwrap();

  assert_eq!(profile.person, c.bob);
  assert!(profile.contact.is_some());
  assert_eq!(profile.contacts.count, 2);
  assert_eq!(profile.photos, Preview::default());
}

#[tokio::test]
async fn stream_and_last_post_respect_visibility() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let c = circle(&fx).await;
  let friends = [c.friends];
  let lookup = PersonLookup::username("bob");

  let err = fx.service.last_post(&lookup, None).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  fx.store.add_post(c.bob.person_id, "hello world", true, &[]).await.unwrap();
  fx.store.add_post(c.bob.person_id, "just friends", false, &friends).await.unwrap();

  let public = fx.service.last_post(&lookup, None).await.unwrap();
  assert_eq!(public.text, "hello world");

  let private = fx.service.last_post(&lookup, Some(&c.alice)).await.unwrap();
  assert_eq!(private.text, "just friends");

  let stream = fx.service.stream(&lookup, Some(&c.alice), None, None).await.unwrap();
  let texts: Vec<&str> = stream.iter().map(|p| p.text.as_str()).collect();
  assert_eq!(texts, vec!["just friends", "hello world"]);

  let older = fx
    .service
    .stream(&lookup, Some(&c.alice), Some(stream[0].created_at), None)
    .await
    .unwrap();
  assert_eq!(older.len(), 1);
  assert_eq!(older[0].text, "hello world");
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sweeping_is_idempotent() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let alice = fx.local("alice").await;
  let bob = fx.local("bob").await;
  let carol = fx.local("carol").await;

  let about_bob = fx.store.add_notification(alice.person_id, PERSON_TARGET, bob.person_id).await.unwrap();
  let again_bob = fx.store.add_notification(alice.person_id, PERSON_TARGET, bob.person_id).await.unwrap();
  let about_carol =
    fx.store.add_notification(alice.person_id, PERSON_TARGET, carol.person_id).await.unwrap();
  let a_post = fx.store.add_notification(alice.person_id, "Post", bob.person_id).await.unwrap();

  let sweeper = NotificationSweeper::new(fx.store.clone());
  let first = sweeper.mark_viewed_notifications_read(alice.person_id, bob.person_id).await.unwrap();
  assert_eq!(first, 2);
  let second = sweeper.mark_viewed_notifications_read(alice.person_id, bob.person_id).await.unwrap();
  assert_eq!(second, 0);

  assert_eq!(fx.store.is_unread(about_bob.notification_id).await.unwrap(), Some(false));
  assert_eq!(fx.store.is_unread(again_bob.notification_id).await.unwrap(), Some(false));
  assert_eq!(fx.store.is_unread(about_carol.notification_id).await.unwrap(), Some(true));
  assert_eq!(fx.store.is_unread(a_post.notification_id).await.unwrap(), Some(true));
}

#[tokio::test]
async fn viewing_a_profile_clears_its_notifications() {
  let fx = Fixture::new(ScriptedFederation::default()).await;
  let alice = fx.viewer("alice").await;
  let bob = fx.local("bob").await;
  let note = fx
    .store
    .add_notification(alice.person_id(), PERSON_TARGET, bob.person_id)
    .await
    .unwrap();

  fx.service
    .view_profile(&PersonLookup::username("bob"), Some(&alice))
    .await
    .unwrap();

  tokio::time::timeout(Duration::from_secs(2), async {
    while fx.store.is_unread(note.notification_id).await.unwrap() == Some(true) {
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
  })
  .await
  .expect("sweep should finish");
}
