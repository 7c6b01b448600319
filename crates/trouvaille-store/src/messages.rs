//! Append and list operations for [`Message`] records.
//!
//! Messages are append-only.  The append runs in a single transaction that
//! also merges the chat's last-message summary and resets the seen markers,
//! so the summary always reflects a durably persisted message.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;

use trouvaille_shared::{ChatId, Message, MessageId, UserId, ValidationError};

use crate::chats::get_chat_tx;
use crate::database::{Store, StoreEvent};
use crate::error::{Result, StoreError};

impl Store {
    /// Append a message to a chat with a store-assigned timestamp.
    ///
    /// The assigned timestamp is strictly greater than every message
    /// already persisted in the chat, so subscriber-observed ordering never
    /// depends on caller clocks.  Non-participants are rejected.
    pub fn append_message(&self, chat_id: &ChatId, sender: &UserId, text: &str) -> Result<Message> {
        let message = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let chat = get_chat_tx(&tx, chat_id)?;
            if !chat.has_participant(sender) {
                return Err(StoreError::InvalidChat(ValidationError::new(
                    "sender",
                    "only participants can send messages",
                )));
            }

            let timestamp = next_message_timestamp(&tx, chat_id)?;
            let message = Message {
                id: MessageId::new(),
                chat_id: chat_id.clone(),
                sender_email: sender.clone(),
                text: text.to_string(),
                timestamp,
            };

            tx.execute(
                "INSERT INTO messages (id, chat_id, sender_email, text, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id.to_string(),
                    chat_id.as_str(),
                    sender.as_str(),
                    message.text,
                    timestamp.to_rfc3339(),
                ],
            )?;

            // Merge the last-message summary onto the chat document.
            tx.execute(
                "UPDATE chats
                 SET last_message = ?2, last_message_timestamp = ?3, last_message_sender = ?4
                 WHERE id = ?1",
                params![
                    chat_id.as_str(),
                    message.text,
                    timestamp.to_rfc3339(),
                    sender.as_str(),
                ],
            )?;

            // A new message makes the thread unread for everyone but the
            // sender.
            tx.execute(
                "DELETE FROM chat_seen WHERE chat_id = ?1 AND user_email <> ?2",
                params![chat_id.as_str(), sender.as_str()],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO chat_seen (chat_id, user_email) VALUES (?1, ?2)",
                params![chat_id.as_str(), sender.as_str()],
            )?;

            tx.commit()?;
            Ok(message)
        })?;

        tracing::debug!(chat = %chat_id, msg = %message.id, "message appended");
        self.emit(StoreEvent::MessageAppended(chat_id.clone()));
        self.emit(StoreEvent::ChatChanged(chat_id.clone()));
        Ok(message)
    }

    /// List a chat's messages, oldest first, insertion order as tiebreak.
    pub fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, sender_email, text, timestamp
                 FROM messages
                 WHERE chat_id = ?1
                 ORDER BY timestamp ASC, seq ASC",
            )?;

            let rows = stmt.query_map(params![chat_id.as_str()], row_to_message)?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
    }
}

/// Pick a timestamp strictly after the chat's newest persisted message.
fn next_message_timestamp(
    conn: &rusqlite::Connection,
    chat_id: &ChatId,
) -> Result<DateTime<Utc>> {
    let latest: Option<String> = conn.query_row(
        "SELECT MAX(timestamp) FROM messages WHERE chat_id = ?1",
        params![chat_id.as_str()],
        |row| row.get(0),
    )?;

    let now = Utc::now();
    match latest {
        Some(ts) => {
            let latest = DateTime::parse_from_rfc3339(&ts)?.with_timezone(&Utc);
            Ok(now.max(latest + Duration::milliseconds(1)))
        }
        None => Ok(now),
    }
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let ts_str: String = row.get(4)?;

    let id = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        id: MessageId(id),
        chat_id: ChatId::from_raw(row.get::<_, String>(1)?),
        sender_email: UserId::new(row.get::<_, String>(2)?),
        text: row.get(3)?,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::NewChat;
    use trouvaille_shared::ItemId;

    fn store_with_chat() -> (Store, ChatId) {
        let store = Store::open_in_memory().unwrap();
        let (chat, _) = store
            .create_chat_if_absent(NewChat {
                creator: UserId::new("bob@campus.edu"),
                counterpart: UserId::new("alice@campus.edu"),
                item_id: ItemId::new(),
                item_title: "Water bottle".to_string(),
            })
            .unwrap();
        (store, chat.id)
    }

    #[test]
    fn append_updates_summary_in_same_transaction() {
        let (store, chat_id) = store_with_chat();
        let bob = UserId::new("bob@campus.edu");

        let msg = store.append_message(&chat_id, &bob, "is this yours?").unwrap();

        let chat = store.get_chat(&chat_id).unwrap();
        assert_eq!(chat.last_message.as_deref(), Some("is this yours?"));
        assert_eq!(chat.last_message_sender, Some(bob.clone()));
        assert_eq!(chat.last_message_timestamp, Some(msg.timestamp));
    }

    #[test]
    fn append_resets_seen_markers_to_sender() {
        let (store, chat_id) = store_with_chat();
        let alice = UserId::new("alice@campus.edu");
        let bob = UserId::new("bob@campus.edu");

        store.mark_chat_seen(&chat_id, &alice).unwrap();
        store.append_message(&chat_id, &bob, "hello").unwrap();

        let chat = store.get_chat(&chat_id).unwrap();
        assert!(chat.is_unread_for(&alice));
        assert!(!chat.is_unread_for(&bob));
    }

    #[test]
    fn timestamps_strictly_increase_per_chat() {
        let (store, chat_id) = store_with_chat();
        let bob = UserId::new("bob@campus.edu");

        let mut prev = None;
        for i in 0..10 {
            let msg = store
                .append_message(&chat_id, &bob, &format!("msg {i}"))
                .unwrap();
            if let Some(prev) = prev {
                assert!(msg.timestamp > prev);
            }
            prev = Some(msg.timestamp);
        }
    }

    #[test]
    fn list_is_ordered_oldest_first() {
        let (store, chat_id) = store_with_chat();
        let bob = UserId::new("bob@campus.edu");
        let alice = UserId::new("alice@campus.edu");

        store.append_message(&chat_id, &bob, "one").unwrap();
        store.append_message(&chat_id, &alice, "two").unwrap();
        store.append_message(&chat_id, &bob, "three").unwrap();

        let texts: Vec<_> = store
            .list_messages(&chat_id)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn non_participant_cannot_send() {
        let (store, chat_id) = store_with_chat();
        let eve = UserId::new("eve@campus.edu");

        assert!(matches!(
            store.append_message(&chat_id, &eve, "hi"),
            Err(StoreError::InvalidChat(_))
        ));
        assert!(store.list_messages(&chat_id).unwrap().is_empty());
    }

    #[test]
    fn append_to_missing_chat_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let id = ChatId::from_raw("a@x-b@x-00000000-0000-0000-0000-000000000000");
        let a = UserId::new("a@x");
        assert!(matches!(
            store.append_message(&id, &a, "hi"),
            Err(StoreError::NotFound)
        ));
    }
}
