//! Item report composition and submission.

use tracing::info;

use trouvaille_shared::{images, validation, Item, ItemStatus};
use trouvaille_store::{NewItem, Store};

use crate::error::ClientError;
use crate::notices::Notices;
use crate::objects::ObjectStoreClient;
use crate::session::Session;

/// An in-progress report form. Owned by the view; nothing here touches the
/// store until [`ReportComposer::submit`].
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: Option<ItemStatus>,
    pub location: String,
    /// Raw bytes of the attached photo, if any.
    pub image: Option<Vec<u8>>,
}

/// Validates, uploads, and persists item reports.
pub struct ReportComposer {
    store: Store,
    objects: ObjectStoreClient,
    notices: Notices,
}

impl ReportComposer {
    pub fn new(store: Store, objects: ObjectStoreClient, notices: Notices) -> Self {
        Self {
            store,
            objects,
            notices,
        }
    }

    /// Submit a draft as a new item report.
    ///
    /// Runs the full pipeline: field validation, then photo compression
    /// and upload when a photo is attached, then the item insert. The
    /// draft is taken by reference and left untouched, so a failed submit
    /// keeps the user's input for correction and retry.  The outcome is
    /// also surfaced as a notice (except inline validation failures).
    pub async fn submit(
        &self,
        session: &Session,
        draft: &ReportDraft,
    ) -> Result<Item, ClientError> {
        match self.try_submit(session, draft).await {
            Ok(item) => {
                self.notices.info("Success!", "Your item has been reported.");
                Ok(item)
            }
            Err(err) => {
                self.notices.operation_failed("Failed to report item", &err);
                Err(err)
            }
        }
    }

    async fn try_submit(
        &self,
        session: &Session,
        draft: &ReportDraft,
    ) -> Result<Item, ClientError> {
        let status = draft
            .status
            .ok_or_else(|| trouvaille_shared::ValidationError::new("status", "select lost or found"))?;
        validation::validate_report(&draft.title, &draft.description, &draft.category, &draft.location)?;

        let image_url = match &draft.image {
            Some(bytes) => {
                let compressed = images::compress_image(bytes, images::CompressionOptions::default())
                    .map_err(|e| ClientError::Upload(e.to_string()))?;
                info!(
                    original = bytes.len(),
                    compressed = compressed.len(),
                    "report photo compressed"
                );
                Some(self.objects.upload(compressed).await?)
            }
            None => None,
        };

        let item = self.store.create_item(NewItem {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            category: draft.category.clone(),
            status,
            location: draft.location.trim().to_string(),
            image_url,
            user_email: session.email.clone(),
            user_name: session.display_name.clone(),
        })?;

        info!(id = %item.id, status = %item.status, "report submitted");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::{Notice, NoticeLevel};
    use tokio::sync::mpsc;
    use trouvaille_shared::FeedFilter;

    fn composer() -> (Store, ReportComposer, mpsc::UnboundedReceiver<Notice>) {
        let store = Store::open_in_memory().unwrap();
        let objects = ObjectStoreClient::new("http://localhost:8080");
        let (notices, rx) = Notices::channel();
        (store.clone(), ReportComposer::new(store, objects, notices), rx)
    }

    fn draft() -> ReportDraft {
        ReportDraft {
            title: "Black iPhone 13 Pro".to_string(),
            description: "Cracked screen protector, blue case.".to_string(),
            category: "Electronics".to_string(),
            status: Some(ItemStatus::Lost),
            location: "Library, 2nd Floor".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn submit_persists_the_report() {
        let (store, composer, mut rx) = composer();
        let session = Session::new("alice@campus.edu", Some("Alice"));

        let item = composer.submit(&session, &draft()).await.unwrap();
        assert_eq!(item.user_email, session.email);
        assert_eq!(item.user_name.as_deref(), Some("Alice"));
        assert!(item.image_url.is_none());

        assert_eq!(store.list_items(FeedFilter::All).unwrap().len(), 1);

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
    }

    #[tokio::test]
    async fn short_title_is_rejected_before_any_write() {
        let (store, composer, mut rx) = composer();
        let session = Session::new("alice@campus.edu", None);

        let mut bad = draft();
        bad.title = "ab".to_string();

        let err = composer.submit(&session, &bad).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(store.list_items(FeedFilter::All).unwrap().is_empty());
        // The draft is untouched and can be corrected.
        assert_eq!(bad.title, "ab");
        // Validation failures render inline, not as a toast.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_status_is_rejected() {
        let (store, composer, _rx) = composer();
        let session = Session::new("alice@campus.edu", None);

        let mut bad = draft();
        bad.status = None;

        assert!(matches!(
            composer.submit(&session, &bad).await,
            Err(ClientError::Validation(_))
        ));
        assert!(store.list_items(FeedFilter::All).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (store, composer, _rx) = composer();
        let session = Session::new("alice@campus.edu", None);

        let mut bad = draft();
        bad.category = "Gadgets".to_string();

        assert!(matches!(
            composer.submit(&session, &bad).await,
            Err(ClientError::Validation(_))
        ));
        assert!(store.list_items(FeedFilter::All).unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_emits_one_error_notice() {
        let (store, composer, mut rx) = composer();
        let session = Session::new("alice@campus.edu", None);

        // Undecodable photo: fails in compression, before any store write.
        let mut bad = draft();
        bad.image = Some(b"not an image".to_vec());

        assert!(matches!(
            composer.submit(&session, &bad).await,
            Err(ClientError::Upload(_))
        ));
        assert!(store.list_items(FeedFilter::All).unwrap().is_empty());

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Failed to report item");
        assert!(rx.try_recv().is_err());
    }
}
