use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// User identity = campus email address, normalized to lowercase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Normalize an email address into a user id (trimmed, lowercased).
    pub fn new(email: impl AsRef<str>) -> Self {
        Self(email.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic chat-thread identifier.
///
/// Derived purely from the two participant emails (lexicographically
/// sorted) and the item id, so both participants always name the same
/// thread and creation is naturally idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Derive the chat id for an unordered participant pair and an item.
    ///
    /// Rejects self-pairs: a user can never hold a thread with themself.
    pub fn derive(a: &UserId, b: &UserId, item: &ItemId) -> Result<Self, ValidationError> {
        if a == b {
            return Err(ValidationError::new(
                "counterpart",
                "chat participants must be two distinct users",
            ));
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self(format!("{lo}-{hi}-{item}")))
    }

    /// Wrap an already-derived id (e.g. one read back from the store or a
    /// navigation link).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an item was lost or found. Closed two-value tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Lost,
    Found,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            other => Err(ValidationError::new(
                "status",
                format!("expected 'lost' or 'found', got '{other}'"),
            )),
        }
    }
}

/// Three-way item feed filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    #[default]
    All,
    Lost,
    Found,
}

impl FeedFilter {
    /// The status this filter matches, or `None` for the unfiltered view.
    pub fn status(&self) -> Option<ItemStatus> {
        match self {
            Self::All => None,
            Self::Lost => Some(ItemStatus::Lost),
            Self::Found => Some(ItemStatus::Found),
        }
    }
}
