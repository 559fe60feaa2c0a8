//! [`SqliteStore`]: the SQLite implementation of the Kinfolk store traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kinfolk_core::{
  contact::{Aspect, ContactEdge},
  media::{Photo, Post},
  notification::NotificationRecord,
  page::Page,
  person::{DiscoveredPerson, PersonRef},
  query::normalize_handle,
  store::{ContactStore, IdentityStore, NotificationStore, PhotoStore, PostStore},
};

use crate::{
  encode::{
    CONTACT_COLUMNS, PERSON_COLUMNS, RawAspect, RawContactEdge, RawItem,
    RawNotification, RawPerson, encode_dt, encode_uuid, escape_like, now,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Queries ─────────────────────────────────────────────────────────────────

/// `?1` = owner, `?2` = viewer. Persons in the owner's `contacts_visible`
/// aspects that also contain the viewer.
const SHARED_CONTACTS_WHERE: &str = "
  p.person_id IN (
    SELECT c.person_id FROM contacts c
    JOIN aspect_memberships am ON am.contact_id = c.contact_id
    JOIN aspects a             ON a.aspect_id   = am.aspect_id
    WHERE c.owner_id = ?1
      AND a.contacts_visible = 1
      AND a.aspect_id IN (
        SELECT am2.aspect_id FROM aspect_memberships am2
        JOIN contacts c2 ON c2.contact_id = am2.contact_id
        WHERE c2.owner_id = ?1 AND c2.person_id = ?2))
  AND p.person_id <> ?2";

/// `i` = the item table alias, `{id}` = its id column, `?1` = author,
/// `?2` = viewer (may be NULL, which leaves only public items).
fn visible_items_where(id: &str) -> String {
  format!(
    "i.author_id = ?1 AND (
       i.public = 1
       OR i.author_id = ?2
       OR EXISTS (
         SELECT 1 FROM item_aspects ia
         JOIN aspect_memberships am ON am.aspect_id  = ia.aspect_id
         JOIN contacts c            ON c.contact_id  = am.contact_id
         WHERE ia.item_id = i.{id}
           AND c.owner_id = i.author_id
           AND c.person_id = ?2))"
  )
}

fn item_aspects_column(id: &str) -> String {
  format!(
    "(SELECT json_group_array(ia.aspect_id) FROM item_aspects ia \
      WHERE ia.item_id = i.{id})"
  )
}

// ─── Seeding input ───────────────────────────────────────────────────────────

/// Input to [`SqliteStore::add_person`].
#[derive(Debug, Clone)]
pub struct NewPerson {
  /// Generated when `None`.
  pub guid:         Option<String>,
  pub username:     Option<String>,
  pub handle:       String,
  pub display_name: Option<String>,
  pub remote:       bool,
  pub searchable:   bool,
}

impl NewPerson {
  /// A local account; the handle is `username@domain`.
  pub fn local(username: &str, domain: &str) -> Self {
    Self {
      guid:         None,
      username:     Some(username.to_owned()),
      handle:       format!("{username}@{domain}"),
      display_name: None,
      remote:       false,
      searchable:   true,
    }
  }

  /// A person living on another node.
  pub fn remote(handle: &str) -> Self {
    Self {
      guid:         None,
      username:     None,
      handle:       handle.to_owned(),
      display_name: None,
      remote:       true,
      searchable:   true,
    }
  }

  pub fn named(mut self, display_name: &str) -> Self {
    self.display_name = Some(display_name.to_owned());
    self
  }

  pub fn unsearchable(mut self) -> Self {
    self.searchable = false;
    self
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kinfolk store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one person matching `condition` (which may use `?1`).
  async fn person_where(
    &self,
    condition: &'static str,
    param: String,
  ) -> Result<Option<PersonRef>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM persons p WHERE {condition}"),
            rusqlite::params![param],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  /// Run a person listing query with `params`, decoding every row.
  async fn persons_query(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<PersonRef>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn count_query(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn items_query(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<RawItem>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }

  // ── Seeding ───────────────────────────────────────────────────────────────

  /// Insert a person row. The handle is stored lowercased.
  pub async fn add_person(&self, input: NewPerson) -> Result<PersonRef> {
    let person = PersonRef {
      person_id:      Uuid::new_v4(),
      guid:           input.guid.unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
      username:       input.username,
      handle:         normalize_handle(&input.handle),
      display_name:   input.display_name,
      remote:         input.remote,
      closed_account: false,
      searchable:     input.searchable,
      created_at:     now(),
    };

    let id_str   = encode_uuid(person.person_id);
    let guid     = person.guid.clone();
    let username = person.username.clone();
    let handle   = person.handle.clone();
    let name     = person.display_name.clone();
    let remote   = person.remote;
    let search   = person.searchable;
    let at_str   = encode_dt(person.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO persons (
             person_id, guid, username, handle, display_name,
             remote, closed_account, searchable, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
          rusqlite::params![id_str, guid, username, handle, name, remote, search, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  /// Deactivate an account.
  pub async fn close_account(&self, person_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(person_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE persons SET closed_account = 1 WHERE person_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::PersonNotFound(person_id.to_string()));
    }
    Ok(())
  }

  pub async fn add_aspect(
    &self,
    owner_id: Uuid,
    name: &str,
    contacts_visible: bool,
  ) -> Result<Aspect> {
    let aspect = Aspect {
      aspect_id: Uuid::new_v4(),
      owner_id,
      name: name.to_owned(),
      contacts_visible,
    };

    let id_str    = encode_uuid(aspect.aspect_id);
    let owner_str = encode_uuid(owner_id);
    let name      = aspect.name.clone();
    let at_str    = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO aspects (aspect_id, owner_id, name, contacts_visible, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, owner_str, name, contacts_visible, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(aspect)
  }

  /// Create the edge `owner → person` and place it in `aspect_ids`.
  pub async fn add_contact(
    &self,
    owner_id: Uuid,
    person_id: Uuid,
    aspect_ids: &[Uuid],
  ) -> Result<ContactEdge> {
    if self.edge_for(owner_id, person_id).await?.is_some() {
      return Err(Error::DuplicateContact { owner_id, person_id });
    }

    let edge = ContactEdge {
      contact_id: Uuid::new_v4(),
      owner_id,
      person_id,
      aspect_ids: aspect_ids.to_vec(),
      created_at: now(),
    };

    let id_str     = encode_uuid(edge.contact_id);
    let owner_str  = encode_uuid(owner_id);
    let person_str = encode_uuid(person_id);
    let at_str     = encode_dt(edge.created_at);
    let aspects: Vec<String> = aspect_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO contacts (contact_id, owner_id, person_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, owner_str, person_str, at_str],
        )?;
        for aspect_id in &aspects {
          tx.execute(
            "INSERT INTO aspect_memberships (aspect_id, contact_id) VALUES (?1, ?2)",
            rusqlite::params![aspect_id, id_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(edge)
  }

  async fn add_item(
    &self,
    table: &'static str,
    author_id: Uuid,
    body: String,
    public: bool,
    aspect_ids: &[Uuid],
  ) -> Result<(Uuid, DateTime<Utc>)> {
    let item_id    = Uuid::new_v4();
    let created_at = now();

    let id_str     = encode_uuid(item_id);
    let author_str = encode_uuid(author_id);
    let at_str     = encode_dt(created_at);
    let aspects: Vec<String> = aspect_ids.iter().copied().map(encode_uuid).collect();

    let (id_col, body_col) = match table {
      "photos" => ("photo_id", "url"),
      _ => ("post_id", "text"),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO {table} ({id_col}, author_id, {body_col}, public, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)"
          ),
          rusqlite::params![id_str, author_str, body, public, at_str],
        )?;
        for aspect_id in &aspects {
          tx.execute(
            "INSERT INTO item_aspects (item_id, aspect_id) VALUES (?1, ?2)",
            rusqlite::params![id_str, aspect_id],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok((item_id, created_at))
  }

  /// Record a photo shared publicly or with some of the author's aspects.
  pub async fn add_photo(
    &self,
    author_id: Uuid,
    url: &str,
    public: bool,
    aspect_ids: &[Uuid],
  ) -> Result<Photo> {
    let (photo_id, created_at) = self
      .add_item("photos", author_id, url.to_owned(), public, aspect_ids)
      .await?;
    Ok(Photo {
      photo_id,
      author_id,
      url: url.to_owned(),
      public,
      aspect_ids: aspect_ids.to_vec(),
      created_at,
    })
  }

  /// Record a post shared publicly or with some of the author's aspects.
  pub async fn add_post(
    &self,
    author_id: Uuid,
    text: &str,
    public: bool,
    aspect_ids: &[Uuid],
  ) -> Result<Post> {
    let (post_id, created_at) = self
      .add_item("posts", author_id, text.to_owned(), public, aspect_ids)
      .await?;
    Ok(Post {
      post_id,
      author_id,
      text: text.to_owned(),
      public,
      aspect_ids: aspect_ids.to_vec(),
      created_at,
    })
  }

  /// Deliver an unread notification.
  pub async fn add_notification(
    &self,
    recipient_id: Uuid,
    target_type: &str,
    target_id: Uuid,
  ) -> Result<NotificationRecord> {
    let record = NotificationRecord {
      notification_id: Uuid::new_v4(),
      recipient_id,
      target_type: target_type.to_owned(),
      target_id,
      unread: true,
    };

    let id_str        = encode_uuid(record.notification_id);
    let recipient_str = encode_uuid(recipient_id);
    let target_type   = record.target_type.clone();
    let target_str    = encode_uuid(target_id);
    let at_str        = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, recipient_id, target_type, target_id, unread, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, recipient_str, target_type, target_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  /// Whether a notification is still unread; `None` if it does not exist.
  pub async fn is_unread(&self, notification_id: Uuid) -> Result<Option<bool>> {
    let id_str = encode_uuid(notification_id);
    let unread = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT unread FROM notifications WHERE notification_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(unread)
  }
}

// ─── IdentityStore ───────────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn find_by_guid(&self, guid: &str) -> Result<Option<PersonRef>> {
    self.person_where("p.guid = ?1", guid.to_owned()).await
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<PersonRef>> {
    self
      .person_where("p.username = ?1 AND p.remote = 0", username.to_owned())
      .await
  }

  async fn find_by_handle(&self, handle: &str) -> Result<Option<PersonRef>> {
    self.person_where("p.handle = ?1", normalize_handle(handle)).await
  }

  async fn search_people(
    &self,
    text: &str,
    viewer_id: Option<Uuid>,
    limit: usize,
  ) -> Result<Vec<PersonRef>> {
    let needle = escape_like(&text.trim().to_lowercase());
    if needle.is_empty() {
      return Ok(Vec::new());
    }

    let sql = format!(
      r"SELECT {PERSON_COLUMNS},
          CASE WHEN p.handle LIKE ?1 ESCAPE '\'
                 OR lower(coalesce(p.display_name, '')) LIKE ?1 ESCAPE '\'
               THEN 0 ELSE 1 END AS rank
        FROM persons p
        WHERE p.closed_account = 0
          AND (p.searchable = 1
               OR p.person_id IN (SELECT c.person_id FROM contacts c WHERE c.owner_id = ?4))
          AND (p.handle LIKE ?2 ESCAPE '\'
               OR lower(coalesce(p.display_name, '')) LIKE ?2 ESCAPE '\')
        ORDER BY rank, p.created_at, p.rowid
        LIMIT ?3"
    );

    self
      .persons_query(sql, vec![
        format!("{needle}%").into(),
        format!("%{needle}%").into(),
        (limit.min(i64::MAX as usize) as i64).into(),
        viewer_id.map(encode_uuid).into(),
      ])
      .await
  }

  async fn record_discovered(&self, person: DiscoveredPerson) -> Result<PersonRef> {
    let handle = normalize_handle(&person.handle);

    let id_str = encode_uuid(Uuid::new_v4());
    let guid   = person.guid.clone();
    let h      = handle.clone();
    let name   = person.display_name.clone();
    let at_str = encode_dt(now());

    let conflict: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
          .query_row(
            "SELECT handle FROM persons WHERE guid = ?1",
            rusqlite::params![guid],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(existing) = existing
          && existing != h
        {
          return Ok(Some(existing));
        }
        let updated = tx.execute(
          "UPDATE persons
           SET display_name = coalesce(?2, display_name)
           WHERE handle = ?1",
          rusqlite::params![h, name],
        )?;
        if updated == 0 {
          tx.execute(
            "INSERT INTO persons (
               person_id, guid, username, handle, display_name,
               remote, closed_account, searchable, created_at
             ) VALUES (?1, ?2, NULL, ?3, ?4, 1, 0, 1, ?5)",
            rusqlite::params![id_str, guid, h, name, at_str],
          )?;
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(existing) = conflict {
      return Err(Error::GuidConflict { guid: person.guid, existing });
    }

    self
      .find_by_handle(&handle)
      .await?
      .ok_or_else(|| Error::PersonNotFound(handle.clone()))
  }
}

// ─── ContactStore ────────────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn edge_for(&self, owner_id: Uuid, person_id: Uuid) -> Result<Option<ContactEdge>> {
    let owner_str  = encode_uuid(owner_id);
    let person_str = encode_uuid(person_id);

    let raw: Option<RawContactEdge> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CONTACT_COLUMNS} FROM contacts c
               WHERE c.owner_id = ?1 AND c.person_id = ?2"
            ),
            rusqlite::params![owner_str, person_str],
            RawContactEdge::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContactEdge::into_edge).transpose()
  }

  async fn edges_for(&self, owner_id: Uuid, person_ids: &[Uuid]) -> Result<Vec<ContactEdge>> {
    if person_ids.is_empty() {
      return Ok(Vec::new());
    }

    let owner_str = encode_uuid(owner_id);
    let ids_json  = serde_json::to_string(
      &person_ids.iter().copied().map(encode_uuid).collect::<Vec<_>>(),
    )?;

    let raws: Vec<RawContactEdge> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts c
           WHERE c.owner_id = ?1
             AND c.person_id IN (SELECT value FROM json_each(?2))"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str, ids_json], RawContactEdge::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContactEdge::into_edge).collect()
  }

  async fn contacts_of(&self, owner_id: Uuid, page: Page) -> Result<Vec<PersonRef>> {
    let sql = format!(
      "SELECT {PERSON_COLUMNS} FROM persons p
       WHERE p.person_id IN (SELECT c.person_id FROM contacts c WHERE c.owner_id = ?1)
       ORDER BY p.created_at, p.rowid
       LIMIT ?2 OFFSET ?3"
    );
    self
      .persons_query(sql, vec![
        encode_uuid(owner_id).into(),
        (page.limit() as i64).into(),
        i64::try_from(page.offset()).unwrap_or(i64::MAX).into(),
      ])
      .await
  }

  async fn count_contacts_of(&self, owner_id: Uuid) -> Result<u64> {
    self
      .count_query(
        "SELECT COUNT(*) FROM contacts c WHERE c.owner_id = ?1".to_owned(),
        vec![encode_uuid(owner_id).into()],
      )
      .await
  }

  async fn shared_contacts_of(
    &self,
    owner_id: Uuid,
    viewer_id: Uuid,
    page: Page,
  ) -> Result<Vec<PersonRef>> {
    let sql = format!(
      "SELECT {PERSON_COLUMNS} FROM persons p
       WHERE {SHARED_CONTACTS_WHERE}
       ORDER BY p.created_at, p.rowid
       LIMIT ?3 OFFSET ?4"
    );
    self
      .persons_query(sql, vec![
        encode_uuid(owner_id).into(),
        encode_uuid(viewer_id).into(),
        (page.limit() as i64).into(),
        i64::try_from(page.offset()).unwrap_or(i64::MAX).into(),
      ])
      .await
  }

  async fn count_shared_contacts_of(&self, owner_id: Uuid, viewer_id: Uuid) -> Result<u64> {
    self
      .count_query(
        format!("SELECT COUNT(*) FROM persons p WHERE {SHARED_CONTACTS_WHERE}"),
        vec![encode_uuid(owner_id).into(), encode_uuid(viewer_id).into()],
      )
      .await
  }

  async fn aspects_of(&self, owner_id: Uuid) -> Result<Vec<Aspect>> {
    let owner_str = encode_uuid(owner_id);

    let raws: Vec<RawAspect> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT aspect_id, owner_id, name, contacts_visible FROM aspects
           WHERE owner_id = ?1
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], |row| {
            Ok(RawAspect {
              aspect_id:        row.get(0)?,
              owner_id:         row.get(1)?,
              name:             row.get(2)?,
              contacts_visible: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAspect::into_aspect).collect()
  }
}

// ─── PhotoStore ──────────────────────────────────────────────────────────────

impl PhotoStore for SqliteStore {
  type Error = Error;

  async fn photos_for(
    &self,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
    page: Page,
  ) -> Result<Vec<Photo>> {
    let sql = format!(
      "SELECT i.photo_id, i.author_id, i.url, i.public, {aspects}, i.created_at
       FROM photos i
       WHERE {visible}
       ORDER BY i.created_at DESC, i.rowid DESC
       LIMIT ?3 OFFSET ?4",
      aspects = item_aspects_column("photo_id"),
      visible = visible_items_where("photo_id"),
    );
    let raws = self
      .items_query(sql, vec![
        encode_uuid(author_id).into(),
        viewer_id.map(encode_uuid).into(),
        (page.limit() as i64).into(),
        i64::try_from(page.offset()).unwrap_or(i64::MAX).into(),
      ])
      .await?;

    raws.into_iter().map(RawItem::into_photo).collect()
  }

  async fn count_photos_for(&self, author_id: Uuid, viewer_id: Option<Uuid>) -> Result<u64> {
    self
      .count_query(
        format!(
          "SELECT COUNT(*) FROM photos i WHERE {}",
          visible_items_where("photo_id")
        ),
        vec![encode_uuid(author_id).into(), viewer_id.map(encode_uuid).into()],
      )
      .await
  }
}

// ─── PostStore ───────────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  type Error = Error;

  async fn visible_posts_for(
    &self,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
    before: Option<DateTime<Utc>>,
    limit: usize,
  ) -> Result<Vec<Post>> {
    let sql = format!(
      "SELECT i.post_id, i.author_id, i.text, i.public, {aspects}, i.created_at
       FROM posts i
       WHERE {visible}
         AND (?3 IS NULL OR i.created_at < ?3)
       ORDER BY i.created_at DESC, i.rowid DESC
       LIMIT ?4",
      aspects = item_aspects_column("post_id"),
      visible = visible_items_where("post_id"),
    );
    let raws = self
      .items_query(sql, vec![
        encode_uuid(author_id).into(),
        viewer_id.map(encode_uuid).into(),
        before.map(encode_dt).into(),
        (limit.min(i64::MAX as usize) as i64).into(),
      ])
      .await?;

    raws.into_iter().map(RawItem::into_post).collect()
  }
}

// ─── NotificationStore ───────────────────────────────────────────────────────

impl NotificationStore for SqliteStore {
  type Error = Error;

  async fn find_unread(
    &self,
    recipient_id: Uuid,
    target_type: &str,
    target_id: Uuid,
  ) -> Result<Vec<NotificationRecord>> {
    let recipient_str = encode_uuid(recipient_id);
    let target_type   = target_type.to_owned();
    let target_str    = encode_uuid(target_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, recipient_id, target_type, target_id, unread
           FROM notifications
           WHERE recipient_id = ?1 AND target_type = ?2 AND target_id = ?3
             AND unread = 1
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![recipient_str, target_type, target_str], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              recipient_id:    row.get(1)?,
              target_type:     row.get(2)?,
              target_id:       row.get(3)?,
              unread:          row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_record).collect()
  }

  async fn mark_read(&self, notification_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(notification_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE notifications SET unread = 0 WHERE notification_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
