//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order matches chronological order. UUIDs are stored as
//! hyphenated lowercase strings. Aspect id lists come back from
//! `json_group_array` sub-selects as JSON arrays.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use kinfolk_core::{
  contact::{Aspect, ContactEdge},
  media::{Photo, Post},
  notification::NotificationRecord,
  person::PersonRef,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_uuid_list(json: &str) -> Result<Vec<Uuid>> {
  let raw: Vec<String> = serde_json::from_str(json)?;
  raw.iter().map(|s| decode_uuid(s)).collect()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps, so values returned
/// from inserts compare equal to values read back.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LIKE patterns ────────────────────────────────────────────────────────────

/// Escape `%`, `_` and `\` for use in a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "p.person_id, p.guid, p.username, p.handle, \
   p.display_name, p.remote, p.closed_account, p.searchable, p.created_at";

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:      String,
  pub guid:           String,
  pub username:       Option<String>,
  pub handle:         String,
  pub display_name:   Option<String>,
  pub remote:         bool,
  pub closed_account: bool,
  pub searchable:     bool,
  pub created_at:     String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:      row.get(0)?,
      guid:           row.get(1)?,
      username:       row.get(2)?,
      handle:         row.get(3)?,
      display_name:   row.get(4)?,
      remote:         row.get(5)?,
      closed_account: row.get(6)?,
      searchable:     row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn into_person(self) -> Result<PersonRef> {
    Ok(PersonRef {
      person_id:      decode_uuid(&self.person_id)?,
      guid:           self.guid,
      username:       self.username,
      handle:         self.handle,
      display_name:   self.display_name,
      remote:         self.remote,
      closed_account: self.closed_account,
      searchable:     self.searchable,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawContactEdge::from_row`].
pub const CONTACT_COLUMNS: &str = "c.contact_id, c.owner_id, c.person_id, \
   (SELECT json_group_array(am.aspect_id) FROM aspect_memberships am \
    WHERE am.contact_id = c.contact_id), c.created_at";

pub struct RawContactEdge {
  pub contact_id: String,
  pub owner_id:   String,
  pub person_id:  String,
  pub aspect_ids: String,
  pub created_at: String,
}

impl RawContactEdge {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id: row.get(0)?,
      owner_id:   row.get(1)?,
      person_id:  row.get(2)?,
      aspect_ids: row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_edge(self) -> Result<ContactEdge> {
    Ok(ContactEdge {
      contact_id: decode_uuid(&self.contact_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      person_id:  decode_uuid(&self.person_id)?,
      aspect_ids: decode_uuid_list(&self.aspect_ids)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAspect {
  pub aspect_id:        String,
  pub owner_id:         String,
  pub name:             String,
  pub contacts_visible: bool,
}

impl RawAspect {
  pub fn into_aspect(self) -> Result<Aspect> {
    Ok(Aspect {
      aspect_id:        decode_uuid(&self.aspect_id)?,
      owner_id:         decode_uuid(&self.owner_id)?,
      name:             self.name,
      contacts_visible: self.contacts_visible,
    })
  }
}

/// Shared shape of `photos` and `posts` rows: id, author, body (url or
/// text), public flag, shared aspect ids, creation time.
pub struct RawItem {
  pub item_id:    String,
  pub author_id:  String,
  pub body:       String,
  pub public:     bool,
  pub aspect_ids: String,
  pub created_at: String,
}

impl RawItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:    row.get(0)?,
      author_id:  row.get(1)?,
      body:       row.get(2)?,
      public:     row.get(3)?,
      aspect_ids: row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_photo(self) -> Result<Photo> {
    Ok(Photo {
      photo_id:   decode_uuid(&self.item_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      url:        self.body,
      public:     self.public,
      aspect_ids: decode_uuid_list(&self.aspect_ids)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:    decode_uuid(&self.item_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      text:       self.body,
      public:     self.public,
      aspect_ids: decode_uuid_list(&self.aspect_ids)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawNotification {
  pub notification_id: String,
  pub recipient_id:    String,
  pub target_type:     String,
  pub target_id:       String,
  pub unread:          bool,
}

impl RawNotification {
  pub fn into_record(self) -> Result<NotificationRecord> {
    Ok(NotificationRecord {
      notification_id: decode_uuid(&self.notification_id)?,
      recipient_id:    decode_uuid(&self.recipient_id)?,
      target_type:     self.target_type,
      target_id:       decode_uuid(&self.target_id)?,
      unread:          self.unread,
    })
  }
}
