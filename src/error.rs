use thiserror::Error;

use crate::models::UserType;

#[derive(Debug, Error)]
pub enum PortalError {
    /// No record matched the credentials, or the session lacks the required role.
    #[error("Authentication failed for {user_type} '{email}'")]
    AuthFailure { email: String, user_type: UserType },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A required field was empty.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = PortalError> = std::result::Result<T, E>;

impl PortalError {
    /// Recoverable errors are shown to the user as a one-line message.
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::AuthFailure { .. } | Self::NotFound { .. } | Self::Validation(_)
        )
    }
}
