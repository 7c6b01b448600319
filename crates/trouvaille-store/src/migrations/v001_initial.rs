//! v001 -- Initial schema creation.
//!
//! Creates the three core collections: `items`, `chats`, and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Items
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS items (
    id          TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    category    TEXT NOT NULL,
    status      TEXT NOT NULL CHECK (status IN ('lost', 'found')),
    location    TEXT NOT NULL,
    image_url   TEXT,
    user_email  TEXT NOT NULL,
    user_name   TEXT,
    timestamp   TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_items_ts ON items(timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_items_status_ts ON items(status, timestamp DESC);

-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
-- The primary key is the deterministic id derived from the sorted
-- participant pair and the item id, which is what makes creation
-- idempotent (INSERT ... ON CONFLICT DO NOTHING).
CREATE TABLE IF NOT EXISTS chats (
    id                     TEXT PRIMARY KEY NOT NULL,
    participant_a          TEXT NOT NULL,    -- lexicographically smaller email
    participant_b          TEXT NOT NULL,
    item_id                TEXT NOT NULL,
    item_title             TEXT NOT NULL,
    created_at             TEXT NOT NULL,
    last_message           TEXT,
    last_message_timestamp TEXT,
    last_message_sender    TEXT,

    CHECK (participant_a < participant_b)
);

CREATE INDEX IF NOT EXISTS idx_chats_participant_a ON chats(participant_a);
CREATE INDEX IF NOT EXISTS idx_chats_participant_b ON chats(participant_b);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
-- `seq` is the insertion order, used as an ordering tiebreak for
-- equal timestamps.
CREATE TABLE IF NOT EXISTS messages (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    id           TEXT NOT NULL UNIQUE,       -- UUID v4
    chat_id      TEXT NOT NULL,              -- FK -> chats(id)
    sender_email TEXT NOT NULL,
    text         TEXT NOT NULL,
    timestamp    TEXT NOT NULL,              -- ISO-8601

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_ts
    ON messages(chat_id, timestamp ASC);
"#;

/// Apply the migration.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
