//! Chat synchronizer.
//!
//! Opening a chat view runs a small state machine: look the thread up by
//! its deterministic id; if it exists, adopt its stored item title and
//! start the live message subscription; if not, either create it from the
//! caller-supplied parameters (conditionally, so racing participants get
//! exactly one thread) or fail terminally with
//! [`ClientError::MissingChatParams`].
//!
//! A [`ChatRoom`] is the `READY` state.  It owns exactly one live
//! [`MessageWatcher`]; dropping the room (navigating away, or opening a
//! different chat id) releases the subscription.

use tracing::{info, warn};

use trouvaille_shared::{validation, Chat, ChatId, ItemId, Message, UserId};
use trouvaille_store::{ChatListWatcher, MessageWatcher, NewChat, Store, StoreError};

use crate::error::ClientError;
use crate::notices::Notices;
use crate::session::Session;

/// Creation parameters the item card passes along when it links into a
/// thread that may not exist yet.
#[derive(Debug, Clone)]
pub struct NewChatParams {
    pub item_id: ItemId,
    pub item_title: String,
    /// The item's reporter -- the other participant.
    pub counterpart: UserId,
}

/// Entry point for chat views: opens threads and watches the chat list.
#[derive(Clone)]
pub struct ChatSynchronizer {
    store: Store,
    notices: Notices,
}

impl ChatSynchronizer {
    pub fn new(store: Store, notices: Notices) -> Self {
        Self { store, notices }
    }

    /// Open (and lazily create) the thread named by `chat_id`.
    ///
    /// `params` are only consulted when the thread does not exist yet.  A
    /// missing or self-referential parameter set is terminal for the view:
    /// the caller renders "not available" and offers no retry.
    pub fn open(
        &self,
        session: &Session,
        chat_id: &ChatId,
        params: Option<NewChatParams>,
    ) -> Result<ChatRoom, ClientError> {
        let chat = match self.store.get_chat(chat_id) {
            Ok(chat) => {
                if !chat.has_participant(&session.email) {
                    warn!(chat = %chat_id, user = %session.email, "non-participant chat open");
                    return Err(ClientError::MissingChatParams);
                }
                chat
            }
            Err(StoreError::NotFound) => self.create_from_params(session, chat_id, params)?,
            Err(other) => return Err(other.into()),
        };

        let watcher = self.store.watch_messages(&chat.id)?;
        Ok(ChatRoom {
            store: self.store.clone(),
            notices: self.notices.clone(),
            user: session.email.clone(),
            chat,
            watcher,
        })
    }

    fn create_from_params(
        &self,
        session: &Session,
        chat_id: &ChatId,
        params: Option<NewChatParams>,
    ) -> Result<Chat, ClientError> {
        let Some(params) = params else {
            return Err(ClientError::MissingChatParams);
        };
        if params.counterpart == session.email {
            return Err(ClientError::MissingChatParams);
        }

        // A link whose parameters do not derive the id it points at is
        // broken, not a creation request.
        let derived = ChatId::derive(&session.email, &params.counterpart, &params.item_id)
            .map_err(|_| ClientError::MissingChatParams)?;
        if derived != *chat_id {
            warn!(requested = %chat_id, derived = %derived, "chat id mismatch");
            return Err(ClientError::MissingChatParams);
        }

        let (chat, created) = self
            .store
            .create_chat_if_absent(NewChat {
                creator: session.email.clone(),
                counterpart: params.counterpart,
                item_id: params.item_id,
                item_title: params.item_title,
            })
            .map_err(|e| match e {
                StoreError::InvalidChat(_) => ClientError::MissingChatParams,
                other => ClientError::Persistence(other),
            })?;

        if created {
            info!(chat = %chat.id, "chat created on first open");
        }
        Ok(chat)
    }

    /// Live list of every thread the user participates in, most recent
    /// activity first.
    pub fn watch_chats(&self, session: &Session) -> Result<ChatListWatcher, ClientError> {
        Ok(self.store.watch_chats(&session.email)?)
    }
}

/// An open chat view: the thread, its live ordered message list, and the
/// send operation.
pub struct ChatRoom {
    store: Store,
    notices: Notices,
    user: UserId,
    chat: Chat,
    watcher: MessageWatcher,
}

impl ChatRoom {
    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// The item title as stored on the thread (never the caller-supplied
    /// one).
    pub fn item_title(&self) -> &str {
        &self.chat.item_title
    }

    /// The latest ordered message snapshot.
    pub fn messages(&self) -> &[Message] {
        self.watcher.messages()
    }

    /// Wait for the next remote append, then return the refreshed ordered
    /// list.
    pub async fn changed(&mut self) -> Result<&[Message], ClientError> {
        Ok(self.watcher.changed().await?)
    }

    /// Send a message.
    ///
    /// The text must be non-empty after trimming.  The message append and
    /// the chat's last-message summary merge are one store transaction; on
    /// any failure nothing is persisted, a notice fires, and the caller
    /// keeps the draft.
    pub fn send(&self, text: &str) -> Result<Message, ClientError> {
        let trimmed = validation::validate_message_text(text)?;
        match self.store.append_message(&self.chat.id, &self.user, trimmed) {
            Ok(message) => Ok(message),
            Err(e) => {
                let err = ClientError::from(e);
                self.notices.operation_failed("Failed to send message", &err);
                Err(err)
            }
        }
    }

    /// Record that the current user has viewed the thread.
    pub fn mark_seen(&self) -> Result<(), ClientError> {
        self.store.mark_chat_seen(&self.chat.id, &self.user)?;
        Ok(())
    }
}
