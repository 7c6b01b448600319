use thiserror::Error;

use trouvaille_shared::ValidationError;
use trouvaille_store::StoreError;

/// Errors surfaced by client operations.
///
/// Everything here maps to a single user-visible treatment: inline field
/// errors for `Validation`, a static "not available" view for
/// `MissingChatParams`, and a transient notice for the rest.  Nothing is
/// retried automatically.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A local form-field violation; never issued a network call.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The operation requires a signed-in identity.
    #[error("You must be logged in.")]
    AuthRequired,

    /// A store read, write, or subscription failed.
    #[error("Storage error: {0}")]
    Persistence(#[from] StoreError),

    /// Photo compression or object-store upload failed.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The category suggestion round trip failed.
    #[error("Could not suggest a category: {0}")]
    Suggestion(String),

    /// The chat does not exist and the view has no (valid) creation
    /// parameters.  Terminal for that view instance.
    #[error("Chat not found or you do not have permission to view it.")]
    MissingChatParams,
}
