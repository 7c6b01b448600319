//! CRUD operations for [`Chat`] threads.
//!
//! The chat id is deterministic (sorted participant pair + item id), so the
//! creation path is a conditional write: whichever participant opens a
//! brand-new thread first creates it, and a concurrent second opener simply
//! adopts the existing row.  No check-then-create race window exists.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use trouvaille_shared::models::CHAT_STARTED;
use trouvaille_shared::{Chat, ChatId, ItemId, UserId, ValidationError};

use crate::database::{Store, StoreEvent};
use crate::error::{Result, StoreError};

/// Parameters for creating a thread on first open.
#[derive(Debug, Clone)]
pub struct NewChat {
    /// The user opening the thread.
    pub creator: UserId,
    /// The other participant (the item's reporter, normally).
    pub counterpart: UserId,
    pub item_id: ItemId,
    pub item_title: String,
}

impl Store {
    /// Create the thread named by the deterministic id, unless it already
    /// exists.
    ///
    /// Returns the chat and whether this call created it.  Self-chats are
    /// rejected before any write.  The freshly created thread carries the
    /// "Chat started." summary seed, with the creator as sender.
    pub fn create_chat_if_absent(&self, new: NewChat) -> Result<(Chat, bool)> {
        let id = ChatId::derive(&new.creator, &new.counterpart, &new.item_id)?;

        let (lo, hi) = if new.creator <= new.counterpart {
            (new.creator.clone(), new.counterpart.clone())
        } else {
            (new.counterpart.clone(), new.creator.clone())
        };

        let created_at = Utc::now();

        let (chat, created) = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO chats (id, participant_a, participant_b, item_id, item_title,
                                    created_at, last_message, last_message_timestamp,
                                    last_message_sender)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    id.as_str(),
                    lo.as_str(),
                    hi.as_str(),
                    new.item_id.to_string(),
                    new.item_title,
                    created_at.to_rfc3339(),
                    CHAT_STARTED,
                    created_at.to_rfc3339(),
                    new.creator.as_str(),
                ],
            )?;

            if inserted > 0 {
                // The creator has obviously seen the fresh thread.
                tx.execute(
                    "INSERT OR IGNORE INTO chat_seen (chat_id, user_email) VALUES (?1, ?2)",
                    params![id.as_str(), new.creator.as_str()],
                )?;
            }

            let chat = get_chat_tx(&tx, &id)?;
            tx.commit()?;
            Ok((chat, inserted > 0))
        })?;

        if created {
            tracing::info!(chat = %id, item = %new.item_id, "chat created");
            self.emit(StoreEvent::ChatChanged(id));
        }

        Ok((chat, created))
    }

    /// Fetch a single chat by its deterministic id.
    pub fn get_chat(&self, id: &ChatId) -> Result<Chat> {
        self.with_conn(|conn| get_chat_tx(conn, id))
    }

    /// List every chat the user participates in, most recent activity
    /// first.
    pub fn list_chats_for_user(&self, user: &UserId) -> Result<Vec<Chat>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, participant_a, participant_b, item_id, item_title, created_at,
                        last_message, last_message_timestamp, last_message_sender
                 FROM chats
                 WHERE participant_a = ?1 OR participant_b = ?1
                 ORDER BY COALESCE(last_message_timestamp, created_at) DESC",
            )?;

            let rows = stmt.query_map(params![user.as_str()], row_to_chat)?;

            let mut chats = Vec::new();
            for row in rows {
                let mut chat = row?;
                chat.seen_by = load_seen_by(conn, &chat.id)?;
                chats.push(chat);
            }
            Ok(chats)
        })
    }

    /// Record that `user` has viewed the thread since its last message.
    ///
    /// Only participants may leave a marker.
    pub fn mark_chat_seen(&self, id: &ChatId, user: &UserId) -> Result<()> {
        let changed = self.with_conn(|conn| {
            let chat = get_chat_tx(conn, id)?;
            if !chat.has_participant(user) {
                return Err(StoreError::InvalidChat(ValidationError::new(
                    "user",
                    "only participants can mark a chat as seen",
                )));
            }

            let changed = conn.execute(
                "INSERT OR IGNORE INTO chat_seen (chat_id, user_email) VALUES (?1, ?2)",
                params![id.as_str(), user.as_str()],
            )?;
            Ok(changed > 0)
        })?;

        if changed {
            self.emit(StoreEvent::ChatChanged(id.clone()));
        }
        Ok(())
    }
}

/// Fetch a chat, including its seen markers, on an open connection or
/// transaction.
pub(crate) fn get_chat_tx(conn: &Connection, id: &ChatId) -> Result<Chat> {
    let mut chat = conn
        .query_row(
            "SELECT id, participant_a, participant_b, item_id, item_title, created_at,
                    last_message, last_message_timestamp, last_message_sender
             FROM chats WHERE id = ?1",
            params![id.as_str()],
            row_to_chat,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            other => StoreError::Sqlite(other),
        })?;
    chat.seen_by = load_seen_by(conn, &chat.id)?;
    Ok(chat)
}

fn load_seen_by(conn: &Connection, id: &ChatId) -> Result<Vec<UserId>> {
    let mut stmt =
        conn.prepare("SELECT user_email FROM chat_seen WHERE chat_id = ?1 ORDER BY user_email")?;
    let rows = stmt.query_map(params![id.as_str()], |row| row.get::<_, String>(0))?;

    let mut seen = Vec::new();
    for row in rows {
        seen.push(UserId::new(row?));
    }
    Ok(seen)
}

/// Map a `rusqlite::Row` to a [`Chat`] (seen markers are loaded
/// separately).
fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chat> {
    let item_id_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;
    let last_ts_str: Option<String> = row.get(7)?;

    let item_id: ItemId = item_id_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let last_message_timestamp = last_ts_str
        .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Chat {
        id: ChatId::from_raw(row.get::<_, String>(0)?),
        participants: [
            UserId::new(row.get::<_, String>(1)?),
            UserId::new(row.get::<_, String>(2)?),
        ],
        item_id,
        item_title: row.get(4)?,
        created_at,
        last_message: row.get(6)?,
        last_message_timestamp,
        last_message_sender: row.get::<_, Option<String>>(8)?.map(UserId::new),
        seen_by: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_chat(creator: &str, counterpart: &str, item: ItemId) -> NewChat {
        NewChat {
            creator: UserId::new(creator),
            counterpart: UserId::new(counterpart),
            item_id: item,
            item_title: "Blue backpack".to_string(),
        }
    }

    #[test]
    fn creation_is_idempotent_across_participants() {
        let store = Store::open_in_memory().unwrap();
        let item = ItemId::new();

        let (first, created_first) = store
            .create_chat_if_absent(new_chat("bob@campus.edu", "alice@campus.edu", item))
            .unwrap();
        assert!(created_first);

        // The other participant opening the same thread re-derives the id.
        let (second, created_second) = store
            .create_chat_if_absent(new_chat("alice@campus.edu", "bob@campus.edu", item))
            .unwrap();
        assert!(!created_second);
        assert_eq!(first.id, second.id);

        // Exactly one row exists, participants sorted.
        let alice = UserId::new("alice@campus.edu");
        let chats = store.list_chats_for_user(&alice).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].participants[0].as_str(), "alice@campus.edu");
        assert_eq!(chats[0].participants[1].as_str(), "bob@campus.edu");
    }

    #[test]
    fn self_chat_is_rejected_without_a_write() {
        let store = Store::open_in_memory().unwrap();
        let item = ItemId::new();

        let err = store
            .create_chat_if_absent(new_chat("alice@campus.edu", "Alice@campus.edu", item))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidChat(_)));

        let alice = UserId::new("alice@campus.edu");
        assert!(store.list_chats_for_user(&alice).unwrap().is_empty());
    }

    #[test]
    fn fresh_chat_carries_summary_seed() {
        let store = Store::open_in_memory().unwrap();
        let (chat, _) = store
            .create_chat_if_absent(new_chat("bob@campus.edu", "alice@campus.edu", ItemId::new()))
            .unwrap();

        assert_eq!(chat.last_message.as_deref(), Some(CHAT_STARTED));
        assert_eq!(
            chat.last_message_sender.as_ref().map(|u| u.as_str()),
            Some("bob@campus.edu")
        );
        assert!(chat.last_message_timestamp.is_some());
        // The creator starts with the only seen marker.
        assert_eq!(chat.seen_by, vec![UserId::new("bob@campus.edu")]);
    }

    #[test]
    fn existing_title_is_not_overwritten() {
        let store = Store::open_in_memory().unwrap();
        let item = ItemId::new();

        store
            .create_chat_if_absent(new_chat("bob@campus.edu", "alice@campus.edu", item))
            .unwrap();

        let mut second = new_chat("alice@campus.edu", "bob@campus.edu", item);
        second.item_title = "A different caller-supplied title".to_string();
        let (chat, created) = store.create_chat_if_absent(second).unwrap();

        assert!(!created);
        assert_eq!(chat.item_title, "Blue backpack");
    }

    #[test]
    fn mark_seen_requires_participation() {
        let store = Store::open_in_memory().unwrap();
        let (chat, _) = store
            .create_chat_if_absent(new_chat("bob@campus.edu", "alice@campus.edu", ItemId::new()))
            .unwrap();

        let eve = UserId::new("eve@campus.edu");
        assert!(matches!(
            store.mark_chat_seen(&chat.id, &eve),
            Err(StoreError::InvalidChat(_))
        ));

        let alice = UserId::new("alice@campus.edu");
        store.mark_chat_seen(&chat.id, &alice).unwrap();
        let fetched = store.get_chat(&chat.id).unwrap();
        assert!(!fetched.is_unread_for(&alice));
    }

    #[test]
    fn missing_chat_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let id = ChatId::from_raw("a@x-b@x-00000000-0000-0000-0000-000000000000");
        assert!(matches!(store.get_chat(&id), Err(StoreError::NotFound)));
    }
}
