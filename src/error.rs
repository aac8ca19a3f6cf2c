/// Error types shared by the countdown and the persisted stores
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Target year {0} is outside the supported calendar range")]
    InvalidTargetYear(i32),

    #[error("Timezone projection produced an impossible wall clock")]
    InvalidWallClock,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Could not determine user data directory")]
    DataDir,

    /// A durable write failed. The in-memory collection was rolled back.
    #[error("Could not save {key}: {reason}")]
    SaveFailed { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_failed_message() {
        let err = AppError::SaveFailed {
            key: "guestbook-storage".to_string(),
            reason: "quota exceeded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not save guestbook-storage: quota exceeded"
        );
    }
}
