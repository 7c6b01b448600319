//! # trouvaille-client
//!
//! The synchronizers a UI builds on: chat threads ([`chat`]), the live item
//! feed ([`feed`]), report submission ([`report`]), and the category
//! suggestion wrapper ([`suggest`]), plus the explicit session context
//! ([`session`]) and transient user notices ([`notices`]).
//!
//! Every operation takes the signed-in [`session::Session`] explicitly;
//! nothing reads ambient global state.  Live views hold exactly one store
//! watcher each and release it on drop.

pub mod chat;
pub mod config;
pub mod feed;
pub mod notices;
pub mod objects;
pub mod report;
pub mod session;
pub mod state;
pub mod suggest;

mod error;

pub use chat::{ChatRoom, ChatSynchronizer, NewChatParams};
pub use config::ClientConfig;
pub use error::ClientError;
pub use feed::ItemFeed;
pub use report::{ReportComposer, ReportDraft};
pub use session::{Identity, Session};
pub use state::AppState;
