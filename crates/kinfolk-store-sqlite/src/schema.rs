//! SQL schema for the Kinfolk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    person_id      TEXT PRIMARY KEY,
    guid           TEXT NOT NULL UNIQUE,
    username       TEXT UNIQUE,              -- NULL for remote persons
    handle         TEXT NOT NULL UNIQUE,     -- always lowercased
    display_name   TEXT,
    remote         INTEGER NOT NULL DEFAULT 0,
    closed_account INTEGER NOT NULL DEFAULT 0,
    searchable     INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS aspects (
    aspect_id        TEXT PRIMARY KEY,
    owner_id         TEXT NOT NULL REFERENCES persons(person_id),
    name             TEXT NOT NULL,
    contacts_visible INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT NOT NULL
);

-- One edge per (owner, person).
CREATE TABLE IF NOT EXISTS contacts (
    contact_id TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES persons(person_id),
    person_id  TEXT NOT NULL REFERENCES persons(person_id),
    created_at TEXT NOT NULL,
    UNIQUE (owner_id, person_id)
);

CREATE TABLE IF NOT EXISTS aspect_memberships (
    aspect_id  TEXT NOT NULL REFERENCES aspects(aspect_id),
    contact_id TEXT NOT NULL REFERENCES contacts(contact_id),
    PRIMARY KEY (aspect_id, contact_id)
);

CREATE TABLE IF NOT EXISTS photos (
    photo_id   TEXT PRIMARY KEY,
    author_id  TEXT NOT NULL REFERENCES persons(person_id),
    url        TEXT NOT NULL,
    public     INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id    TEXT PRIMARY KEY,
    author_id  TEXT NOT NULL REFERENCES persons(person_id),
    text       TEXT NOT NULL,
    public     INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Which aspects a photo or post was shared with.
CREATE TABLE IF NOT EXISTS item_aspects (
    item_id   TEXT NOT NULL,
    aspect_id TEXT NOT NULL REFERENCES aspects(aspect_id),
    PRIMARY KEY (item_id, aspect_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    recipient_id    TEXT NOT NULL REFERENCES persons(person_id),
    target_type     TEXT NOT NULL,
    target_id       TEXT NOT NULL,
    unread          INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_owner_idx        ON contacts(owner_id);
CREATE INDEX IF NOT EXISTS aspects_owner_idx         ON aspects(owner_id);
CREATE INDEX IF NOT EXISTS photos_author_idx         ON photos(author_id, created_at);
CREATE INDEX IF NOT EXISTS posts_author_idx          ON posts(author_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_target_idx  ON notifications(recipient_id, target_type, target_id);

PRAGMA user_version = 1;
";
