//! Live item feed.
//!
//! Thin wrapper over [`ItemWatcher`] that adds filter switching: changing
//! the filter drops the old subscription and opens a new one, so there is
//! never more than one live feed query per view.

use trouvaille_shared::{FeedFilter, Item};
use trouvaille_store::{ItemWatcher, Store};

use crate::error::ClientError;

/// The home-page feed: every reported item under the active filter,
/// newest first, updated live.
pub struct ItemFeed {
    store: Store,
    watcher: ItemWatcher,
}

impl ItemFeed {
    /// Open the feed with the unfiltered view.
    pub fn open(store: Store) -> Result<Self, ClientError> {
        Self::open_with(store, FeedFilter::All)
    }

    pub fn open_with(store: Store, filter: FeedFilter) -> Result<Self, ClientError> {
        let watcher = store.watch_items(filter)?;
        Ok(Self { store, watcher })
    }

    pub fn filter(&self) -> FeedFilter {
        self.watcher.filter()
    }

    /// Switch the active filter. Re-selecting the current filter is a
    /// no-op and keeps the existing subscription.
    pub fn set_filter(&mut self, filter: FeedFilter) -> Result<(), ClientError> {
        if filter == self.watcher.filter() {
            return Ok(());
        }
        self.watcher = self.store.watch_items(filter)?;
        Ok(())
    }

    /// The latest snapshot under the active filter.
    pub fn items(&self) -> &[Item] {
        self.watcher.items()
    }

    /// Wait for the next feed change, then return the refreshed snapshot.
    pub async fn changed(&mut self) -> Result<&[Item], ClientError> {
        Ok(self.watcher.changed().await?)
    }
}
