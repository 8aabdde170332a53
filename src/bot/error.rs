use thiserror::Error;

use crate::services::moderation::MuteStoreError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord API error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Mute store error: {0}")]
    Store(#[from] MuteStoreError),

    #[error("No mute role is configured for this guild. Use `/muterole <role>` to set one up.")]
    MuteRoleNotConfigured,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Error::Custom(msg.into())
    }
}
