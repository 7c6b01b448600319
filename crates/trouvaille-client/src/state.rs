//! Application composition root.

use tokio::sync::mpsc;

use trouvaille_store::Store;

use crate::chat::ChatSynchronizer;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::feed::ItemFeed;
use crate::notices::{Notice, Notices};
use crate::objects::ObjectStoreClient;
use crate::report::ReportComposer;
use crate::session::Identity;
use crate::suggest::SuggestionClient;

/// Everything a UI shell needs, wired together once at startup.
pub struct AppState {
    pub identity: Identity,
    pub store: Store,
    pub chats: ChatSynchronizer,
    pub reports: ReportComposer,
    pub suggester: SuggestionClient,
    pub notices: Notices,
}

impl AppState {
    /// Build the application against the platform-default data directory.
    pub fn new(config: &ClientConfig) -> Result<(Self, mpsc::UnboundedReceiver<Notice>), ClientError> {
        let store = Store::open()?;
        Ok(Self::with_store(config, store))
    }

    /// Build the application over an already-opened store. Tests use this
    /// with an in-memory store.
    pub fn with_store(
        config: &ClientConfig,
        store: Store,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let objects = ObjectStoreClient::new(config.object_store_url.clone());
        let (notices, notice_rx) = Notices::channel();
        let state = Self {
            identity: Identity::new(),
            chats: ChatSynchronizer::new(store.clone(), notices.clone()),
            reports: ReportComposer::new(store.clone(), objects, notices.clone()),
            suggester: SuggestionClient::new(
                config.suggest_api_url.clone(),
                config.suggest_api_key.clone(),
            ),
            store,
            notices,
        };
        (state, notice_rx)
    }

    /// Open the live item feed.
    pub fn feed(&self) -> Result<ItemFeed, ClientError> {
        ItemFeed::open(self.store.clone())
    }
}
