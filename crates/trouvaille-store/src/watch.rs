//! Live query watchers.
//!
//! A watcher pairs an initial snapshot with a subscription to the store's
//! change feed: `changed().await` parks until a relevant write lands, then
//! re-runs the query and returns the fresh snapshot.  Dropping the watcher
//! releases the subscription; there is no explicit cancel call.
//!
//! Watchers subscribe to the event bus *before* taking their snapshot, so
//! a write racing the construction is never missed (the worst case is one
//! redundant re-query).

use tokio::sync::broadcast;

use trouvaille_shared::{Chat, ChatId, FeedFilter, Item, Message, UserId};

use crate::database::{Store, StoreEvent};
use crate::error::{Result, StoreError};

impl Store {
    /// Watch the item feed under a filter, newest first.
    pub fn watch_items(&self, filter: FeedFilter) -> Result<ItemWatcher> {
        let rx = self.subscribe_events();
        let current = self.list_items(filter)?;
        Ok(ItemWatcher {
            store: self.clone(),
            filter,
            rx,
            current,
        })
    }

    /// Watch one chat's ordered message list.
    pub fn watch_messages(&self, chat_id: &ChatId) -> Result<MessageWatcher> {
        let rx = self.subscribe_events();
        let current = self.list_messages(chat_id)?;
        Ok(MessageWatcher {
            store: self.clone(),
            chat_id: chat_id.clone(),
            rx,
            current,
        })
    }

    /// Watch a user's chat list, most recent activity first.
    pub fn watch_chats(&self, user: &UserId) -> Result<ChatListWatcher> {
        let rx = self.subscribe_events();
        let current = self.list_chats_for_user(user)?;
        Ok(ChatListWatcher {
            store: self.clone(),
            user: user.clone(),
            rx,
            current,
        })
    }
}

/// Wait on the receiver until `relevant` matches an event.
///
/// A lagged receiver is treated as a wake-up: the follow-up re-query
/// observes everything the missed notifications would have announced.
async fn wait_for(
    rx: &mut broadcast::Receiver<StoreEvent>,
    mut relevant: impl FnMut(&StoreEvent) -> bool,
) -> Result<()> {
    loop {
        match rx.recv().await {
            Ok(event) if relevant(&event) => return Ok(()),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => return Ok(()),
            Err(broadcast::error::RecvError::Closed) => return Err(StoreError::SubscriptionClosed),
        }
    }
}

/// Live, filtered, ordered view of the `items` collection.
pub struct ItemWatcher {
    store: Store,
    filter: FeedFilter,
    rx: broadcast::Receiver<StoreEvent>,
    current: Vec<Item>,
}

impl ItemWatcher {
    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    /// The latest snapshot.
    pub fn items(&self) -> &[Item] {
        &self.current
    }

    /// Wait for the next change to the items collection, then return the
    /// refreshed snapshot.
    pub async fn changed(&mut self) -> Result<&[Item]> {
        wait_for(&mut self.rx, |e| matches!(e, StoreEvent::ItemsChanged)).await?;
        self.current = self.store.list_items(self.filter)?;
        Ok(&self.current)
    }
}

/// Live ascending-ordered view of one chat's messages.
pub struct MessageWatcher {
    store: Store,
    chat_id: ChatId,
    rx: broadcast::Receiver<StoreEvent>,
    current: Vec<Message>,
}

impl MessageWatcher {
    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.current
    }

    /// Wait for the next append to this chat, then return the refreshed
    /// ordered list.
    pub async fn changed(&mut self) -> Result<&[Message]> {
        let chat_id = self.chat_id.clone();
        wait_for(&mut self.rx, |e| {
            matches!(e, StoreEvent::MessageAppended(id) if *id == chat_id)
        })
        .await?;
        self.current = self.store.list_messages(&self.chat_id)?;
        Ok(&self.current)
    }
}

/// Live view of every chat a user participates in.
pub struct ChatListWatcher {
    store: Store,
    user: UserId,
    rx: broadcast::Receiver<StoreEvent>,
    current: Vec<Chat>,
}

impl ChatListWatcher {
    pub fn chats(&self) -> &[Chat] {
        &self.current
    }

    /// Wait for any chat-affecting write, then return the refreshed list.
    ///
    /// Chat events are not filtered by membership here; the re-query is
    /// what scopes the result to the user.
    pub async fn changed(&mut self) -> Result<&[Chat]> {
        wait_for(&mut self.rx, |e| {
            matches!(
                e,
                StoreEvent::ChatChanged(_) | StoreEvent::MessageAppended(_)
            )
        })
        .await?;
        self.current = self.store.list_chats_for_user(&self.user)?;
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::NewChat;
    use crate::items::NewItem;
    use std::time::Duration;
    use tokio::time::timeout;
    use trouvaille_shared::{ItemId, ItemStatus};

    fn new_item(title: &str, status: ItemStatus) -> NewItem {
        NewItem {
            title: title.to_string(),
            description: "spotted near the gym entrance".to_string(),
            category: "Other".to_string(),
            status,
            location: "Sports Center".to_string(),
            image_url: None,
            user_email: UserId::new("reporter@campus.edu"),
            user_name: None,
        }
    }

    #[tokio::test]
    async fn item_watcher_sees_new_items() {
        let store = Store::open_in_memory().unwrap();
        let mut watcher = store.watch_items(FeedFilter::All).unwrap();
        assert!(watcher.items().is_empty());

        store.create_item(new_item("Found badge", ItemStatus::Found)).unwrap();

        let items = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .expect("watcher should wake")
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Found badge");
    }

    #[tokio::test]
    async fn filtered_watcher_requeries_with_its_filter() {
        let store = Store::open_in_memory().unwrap();
        let mut watcher = store.watch_items(FeedFilter::Lost).unwrap();

        store.create_item(new_item("Found badge", ItemStatus::Found)).unwrap();
        store.create_item(new_item("Lost scarf", ItemStatus::Lost)).unwrap();

        let items = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .expect("watcher should wake")
            .unwrap();
        assert!(items.iter().all(|i| i.status == ItemStatus::Lost));
    }

    #[tokio::test]
    async fn message_watcher_only_wakes_for_its_chat() {
        let store = Store::open_in_memory().unwrap();
        let item = ItemId::new();
        let bob = UserId::new("bob@campus.edu");

        let (chat, _) = store
            .create_chat_if_absent(NewChat {
                creator: bob.clone(),
                counterpart: UserId::new("alice@campus.edu"),
                item_id: item,
                item_title: "Umbrella".to_string(),
            })
            .unwrap();
        let (other, _) = store
            .create_chat_if_absent(NewChat {
                creator: bob.clone(),
                counterpart: UserId::new("carol@campus.edu"),
                item_id: item,
                item_title: "Umbrella".to_string(),
            })
            .unwrap();

        let mut watcher = store.watch_messages(&chat.id).unwrap();

        // A write to a different chat must not wake this watcher.
        store.append_message(&other.id, &bob, "other thread").unwrap();
        assert!(
            timeout(Duration::from_millis(100), watcher.changed())
                .await
                .is_err(),
            "watcher woke for an unrelated chat"
        );

        store.append_message(&chat.id, &bob, "hello").unwrap();
        let messages = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .expect("watcher should wake")
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "hello");
    }

    #[tokio::test]
    async fn chat_list_watcher_observes_summary_updates() {
        let store = Store::open_in_memory().unwrap();
        let alice = UserId::new("alice@campus.edu");
        let bob = UserId::new("bob@campus.edu");

        let (chat, _) = store
            .create_chat_if_absent(NewChat {
                creator: bob.clone(),
                counterpart: alice.clone(),
                item_id: ItemId::new(),
                item_title: "Calculator".to_string(),
            })
            .unwrap();

        let mut watcher = store.watch_chats(&alice).unwrap();
        store.append_message(&chat.id, &bob, "is this yours?").unwrap();

        let chats = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .expect("watcher should wake")
            .unwrap();
        assert_eq!(chats[0].last_message.as_deref(), Some("is this yours?"));
        assert!(chats[0].is_unread_for(&alice));
    }
}
