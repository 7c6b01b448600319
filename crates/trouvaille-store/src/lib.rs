//! # trouvaille-store
//!
//! The document store behind the lost-and-found application: three
//! collections (`items`, `chats`, `messages`) held in SQLite, with typed
//! CRUD helpers and live query watchers.
//!
//! The contract this crate upholds for the synchronizers on top of it:
//!
//! - every creation timestamp is assigned here at commit, never by callers;
//! - chat creation is conditional (`create_chat_if_absent`), so a thread is
//!   created exactly once no matter how many participants race to open it;
//! - a message append, the chat's last-message summary merge, and the
//!   seen-marker reset happen in one SQLite transaction, so the summary can
//!   never reference a message that was not durably persisted;
//! - message timestamps are strictly increasing within a chat.

pub mod chats;
pub mod database;
pub mod items;
pub mod messages;
pub mod migrations;
pub mod watch;

mod error;

pub use chats::NewChat;
pub use database::{Store, StoreEvent};
pub use error::StoreError;
pub use items::NewItem;
pub use watch::{ChatListWatcher, ItemWatcher, MessageWatcher};
