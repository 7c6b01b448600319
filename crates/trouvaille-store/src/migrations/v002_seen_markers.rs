//! v002 -- Seen markers for unread tracking.
//!
//! One row per (chat, user) pair that has viewed the thread since its last
//! message.  The append transaction clears the table back to the sender.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chat_seen (
    chat_id    TEXT NOT NULL,
    user_email TEXT NOT NULL,

    PRIMARY KEY (chat_id, user_email),
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);
"#;

/// Apply the migration.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
