//! Transient user-visible notifications (the "toast" concern).
//!
//! Operation failures are converted to a single [`Notice`] at the call
//! boundary; the UI drains the receiver and renders them however it likes.
//! A notice is also logged, so nothing is ever silently swallowed even if
//! no UI is listening.

use tokio::sync::mpsc;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

/// Sender half handed to the synchronizers.
#[derive(Clone)]
pub struct Notices {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notices {
    /// Create a notice channel; the receiver goes to the UI loop.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn info(&self, title: impl Into<String>, body: impl Into<String>) {
        self.emit(Notice {
            level: NoticeLevel::Info,
            title: title.into(),
            body: body.into(),
        });
    }

    pub fn error(&self, title: impl Into<String>, body: impl Into<String>) {
        self.emit(Notice {
            level: NoticeLevel::Error,
            title: title.into(),
            body: body.into(),
        });
    }

    /// Convert an operation failure into a single error notice.
    ///
    /// `Validation` renders inline next to its field and
    /// `MissingChatParams` has its own static view, so neither produces a
    /// toast.
    pub fn operation_failed(&self, title: impl Into<String>, err: &ClientError) {
        match err {
            ClientError::Validation(_) | ClientError::MissingChatParams => {}
            other => self.error(title, other.to_string()),
        }
    }

    fn emit(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(title = %notice.title, body = %notice.body, "notice"),
            NoticeLevel::Error => tracing::warn!(title = %notice.title, body = %notice.body, "notice"),
        }
        // UI gone (receiver dropped) is fine; the line above already
        // recorded the diagnostic.
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notices_reach_the_receiver_in_order() {
        let (notices, mut rx) = Notices::channel();
        notices.info("Success!", "Your item has been reported.");
        notices.error("Error", "Could not send message.");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, NoticeLevel::Info);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn operation_failures_skip_inline_variants() {
        let (notices, mut rx) = Notices::channel();

        let inline = ClientError::Validation(trouvaille_shared::ValidationError::new(
            "title",
            "Title must be at least 3 characters.",
        ));
        notices.operation_failed("Failed to report item", &inline);
        notices.operation_failed("Chat unavailable", &ClientError::MissingChatParams);
        notices.operation_failed("Failed to report item", &ClientError::Upload("timed out".into()));

        let only = rx.try_recv().unwrap();
        assert_eq!(only.level, NoticeLevel::Error);
        assert_eq!(only.title, "Failed to report item");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emitting_without_a_receiver_does_not_panic() {
        let (notices, rx) = Notices::channel();
        drop(rx);
        notices.error("Error", "Failed to report item.");
    }
}
