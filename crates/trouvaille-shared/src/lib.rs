//! # trouvaille-shared
//!
//! Domain types shared by every Trouvaille crate: item / chat / message
//! models, the deterministic chat-id derivation, field validation rules,
//! and the image compression helper used before photo upload.

pub mod images;
pub mod models;
pub mod types;
pub mod validation;

mod error;

pub use error::{ImageError, ValidationError};
pub use models::{Chat, Item, Message};
pub use types::{ChatId, FeedFilter, ItemId, ItemStatus, MessageId, UserId};
