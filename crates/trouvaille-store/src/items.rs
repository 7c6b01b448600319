//! CRUD operations for [`Item`] records.
//!
//! Items are immutable after creation; there is no update or delete path.

use chrono::{DateTime, Utc};
use rusqlite::params;

use trouvaille_shared::{FeedFilter, Item, ItemId, ItemStatus, UserId};

use crate::database::{Store, StoreEvent};
use crate::error::{Result, StoreError};

/// Caller-supplied fields for a new item report. The store assigns the id
/// and the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: ItemStatus,
    pub location: String,
    pub image_url: Option<String>,
    pub user_email: UserId,
    pub user_name: Option<String>,
}

impl Store {
    /// Insert a new item with a store-assigned id and timestamp.
    pub fn create_item(&self, new: NewItem) -> Result<Item> {
        let item = Item {
            id: ItemId::new(),
            title: new.title,
            description: new.description,
            category: new.category,
            status: new.status,
            location: new.location,
            image_url: new.image_url,
            user_email: new.user_email,
            user_name: new.user_name,
            timestamp: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO items (id, title, description, category, status, location,
                                    image_url, user_email, user_name, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    item.id.to_string(),
                    item.title,
                    item.description,
                    item.category,
                    item.status.as_str(),
                    item.location,
                    item.image_url,
                    item.user_email.as_str(),
                    item.user_name,
                    item.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(id = %item.id, status = %item.status, "item created");
        self.emit(StoreEvent::ItemsChanged);
        Ok(item)
    }

    /// Fetch a single item by id.
    pub fn get_item(&self, id: &ItemId) -> Result<Item> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, description, category, status, location,
                        image_url, user_email, user_name, timestamp
                 FROM items WHERE id = ?1",
                params![id.to_string()],
                row_to_item,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
        })
    }

    /// List items for the feed, newest first.
    ///
    /// `Lost` / `Found` apply a store-side equality filter; `All` is the
    /// unfiltered view.
    pub fn list_items(&self, filter: FeedFilter) -> Result<Vec<Item>> {
        self.with_conn(|conn| {
            let mut items = Vec::new();
            match filter.status() {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, description, category, status, location,
                                image_url, user_email, user_name, timestamp
                         FROM items
                         WHERE status = ?1
                         ORDER BY timestamp DESC",
                    )?;
                    let rows = stmt.query_map(params![status.as_str()], row_to_item)?;
                    for row in rows {
                        items.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, description, category, status, location,
                                image_url, user_email, user_name, timestamp
                         FROM items
                         ORDER BY timestamp DESC",
                    )?;
                    let rows = stmt.query_map([], row_to_item)?;
                    for row in rows {
                        items.push(row?);
                    }
                }
            }
            Ok(items)
        })
    }
}

/// Map a `rusqlite::Row` to an [`Item`].
fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    let id_str: String = row.get(0)?;
    let status_str: String = row.get(4)?;
    let ts_str: String = row.get(9)?;

    let id: ItemId = id_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status: ItemStatus = status_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Item {
        id,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        status,
        location: row.get(5)?,
        image_url: row.get(6)?,
        user_email: UserId::new(row.get::<_, String>(7)?),
        user_name: row.get(8)?,
        timestamp,
    })
}
