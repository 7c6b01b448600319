//! Domain model structs persisted in the document store.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer.  Creation timestamps are always assigned by the
//! store at commit, never by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, ItemId, ItemStatus, MessageId, UserId};

/// Summary text written when a thread is first created, before any real
/// message exists.
pub const CHAT_STARTED: &str = "Chat started.";

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A lost-or-found item report. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Unique item identifier.
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Whether the reporter lost or found the item.
    pub status: ItemStatus,
    /// Free-text campus location ("Library, 2nd Floor").
    pub location: String,
    /// Retrievable URL of the (compressed) photo, if one was attached.
    pub image_url: Option<String>,
    /// Email of the reporting user.
    pub user_email: UserId,
    /// Display name of the reporting user, when the identity provider
    /// supplied one.
    pub user_name: Option<String>,
    /// Store-assigned creation time; the feed sorts on this.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A two-party chat thread attached to one item.
///
/// The id is deterministic ([`ChatId::derive`]); `participants` always
/// matches the sorted-id derivation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    /// Exactly two distinct users, stored sorted.
    pub participants: [UserId; 2],
    pub item_id: ItemId,
    /// Title of the item the thread is about, frozen at creation.
    pub item_title: String,
    pub created_at: DateTime<Utc>,
    /// Text of the most recently persisted message.
    pub last_message: Option<String>,
    pub last_message_timestamp: Option<DateTime<Utc>>,
    pub last_message_sender: Option<UserId>,
    /// Users who have viewed the thread since the last message.
    pub seen_by: Vec<UserId>,
}

impl Chat {
    /// Whether `user` is one of the two participants.
    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| p == user)
    }

    /// The other participant, from `user`'s point of view.
    pub fn counterpart_of(&self, user: &UserId) -> Option<&UserId> {
        self.participants.iter().find(|p| *p != user)
    }

    /// A thread is unread for a user until they have viewed it since the
    /// last message.
    pub fn is_unread_for(&self, user: &UserId) -> bool {
        !self.seen_by.contains(user)
    }

    /// Chat-list preview line: last message, prefixed with "You: " when the
    /// viewer sent it.
    pub fn preview_for(&self, viewer: &UserId) -> String {
        match &self.last_message {
            Some(text) if self.last_message_sender.as_ref() == Some(viewer) => {
                format!("You: {text}")
            }
            Some(text) => text.clone(),
            None => "No messages yet.".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_email: UserId,
    pub text: String,
    /// Store-assigned, strictly increasing within a chat.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatId;

    fn chat(last_sender: Option<&str>, seen_by: Vec<&str>) -> Chat {
        let a = UserId::new("alice@campus.edu");
        let b = UserId::new("bob@campus.edu");
        let item = ItemId::new();
        Chat {
            id: ChatId::derive(&a, &b, &item).unwrap(),
            participants: [a, b],
            item_id: item,
            item_title: "Black iPhone 13 Pro".into(),
            created_at: Utc::now(),
            last_message: last_sender.map(|_| "hello".to_string()),
            last_message_timestamp: last_sender.map(|_| Utc::now()),
            last_message_sender: last_sender.map(UserId::new),
            seen_by: seen_by.into_iter().map(UserId::new).collect(),
        }
    }

    #[test]
    fn counterpart_is_the_other_user() {
        let c = chat(None, vec![]);
        let alice = UserId::new("alice@campus.edu");
        assert_eq!(
            c.counterpart_of(&alice).unwrap().as_str(),
            "bob@campus.edu"
        );
    }

    #[test]
    fn unread_until_seen() {
        let alice = UserId::new("alice@campus.edu");
        assert!(chat(Some("bob@campus.edu"), vec!["bob@campus.edu"]).is_unread_for(&alice));
        assert!(!chat(Some("bob@campus.edu"), vec!["alice@campus.edu"]).is_unread_for(&alice));
    }

    #[test]
    fn preview_prefixes_own_messages() {
        let alice = UserId::new("alice@campus.edu");
        assert_eq!(
            chat(Some("alice@campus.edu"), vec![]).preview_for(&alice),
            "You: hello"
        );
        assert_eq!(chat(Some("bob@campus.edu"), vec![]).preview_for(&alice), "hello");
        assert_eq!(chat(None, vec![]).preview_for(&alice), "No messages yet.");
    }
}
