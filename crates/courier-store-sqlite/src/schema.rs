//! SQL schema for the Courier SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS recipients (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    kind                 TEXT NOT NULL,   -- 'individual' | 'group' | 'distribution_list'
    service_id           TEXT UNIQUE,
    group_id             TEXT UNIQUE,
    distribution_list_id INTEGER UNIQUE,
    expire_messages      INTEGER NOT NULL DEFAULT 0,   -- seconds
    blocked              INTEGER NOT NULL DEFAULT 0,
    story_eligible       INTEGER NOT NULL DEFAULT 0,
    is_self              INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS distribution_lists (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT NOT NULL,
    distribution_id    TEXT NOT NULL UNIQUE,
    recipient_id       INTEGER REFERENCES recipients(id),
    allows_replies     INTEGER NOT NULL DEFAULT 1,
    deletion_timestamp INTEGER NOT NULL DEFAULT 0,
    is_unknown         INTEGER NOT NULL DEFAULT 0,
    privacy_mode       TEXT NOT NULL DEFAULT 'ONLY_WITH'
);

-- Names are unique among live lists only; deleted lists keep theirs.
CREATE UNIQUE INDEX IF NOT EXISTS distribution_lists_live_name_idx
    ON distribution_lists(name) WHERE deletion_timestamp = 0;

-- Each row belongs to the privacy mode it was written under.
CREATE TABLE IF NOT EXISTS distribution_list_members (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    list_id      INTEGER NOT NULL REFERENCES distribution_lists(id) ON DELETE CASCADE,
    recipient_id INTEGER NOT NULL,
    privacy_mode TEXT NOT NULL,
    UNIQUE (list_id, recipient_id, privacy_mode)
);

CREATE TABLE IF NOT EXISTS threads (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient_id  INTEGER NOT NULL UNIQUE REFERENCES recipients(id),
    date          INTEGER NOT NULL DEFAULT 0,
    message_count INTEGER NOT NULL DEFAULT 0,
    snippet       TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    date_sent           INTEGER NOT NULL,
    date_received       INTEGER NOT NULL,
    date_server         INTEGER NOT NULL DEFAULT -1,
    thread_id           INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    from_recipient_id   INTEGER NOT NULL,
    to_recipient_id     INTEGER NOT NULL,
    type                INTEGER NOT NULL,
    body                TEXT,
    body_ranges         TEXT,             -- JSON array or NULL
    read                INTEGER NOT NULL DEFAULT 0,
    expires_in          INTEGER NOT NULL DEFAULT 0,   -- milliseconds
    expire_started      INTEGER NOT NULL DEFAULT 0,
    notified            INTEGER NOT NULL DEFAULT 0,
    notified_timestamp  INTEGER NOT NULL DEFAULT 0,
    reactions_last_seen INTEGER NOT NULL DEFAULT -1,
    story_type          INTEGER NOT NULL DEFAULT 0,
    unidentified        INTEGER NOT NULL DEFAULT 0,
    remote_deleted      INTEGER NOT NULL DEFAULT 0,
    original_message_id INTEGER,
    latest_revision_id  INTEGER,
    revision_number     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS attachments (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id      INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    content_type    TEXT NOT NULL,
    remote_key      BLOB,
    remote_location TEXT,
    remote_digest   BLOB,
    size            INTEGER NOT NULL DEFAULT 0,
    file_name       TEXT,
    width           INTEGER NOT NULL DEFAULT 0,
    height          INTEGER NOT NULL DEFAULT 0,
    caption         TEXT,
    transfer_state  TEXT NOT NULL,
    unique_id       TEXT NOT NULL,
    transfer_file   TEXT
);

CREATE TABLE IF NOT EXISTS key_value (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS members_list_idx        ON distribution_list_members(list_id);
CREATE INDEX IF NOT EXISTS messages_thread_idx     ON messages(thread_id);
CREATE INDEX IF NOT EXISTS messages_sent_idx       ON messages(date_sent, from_recipient_id);
CREATE INDEX IF NOT EXISTS messages_original_idx   ON messages(original_message_id);
CREATE INDEX IF NOT EXISTS attachments_message_idx ON attachments(message_id);

-- The built-in My Story list and the recipient that addresses it.
INSERT OR IGNORE INTO distribution_lists (id, name, distribution_id, allows_replies, privacy_mode)
    VALUES (1, 'My Story', '00000000-0000-0000-0000-000000000000', 1, 'ALL');
INSERT OR IGNORE INTO recipients (kind, distribution_list_id)
    VALUES ('distribution_list', 1);
UPDATE distribution_lists
    SET recipient_id = (SELECT id FROM recipients WHERE distribution_list_id = 1)
    WHERE id = 1 AND recipient_id IS NULL;

PRAGMA user_version = 1;
";
