//! Error kinds for the content store and the translation session.
//!
//! None of these are fatal to a session. Loads degrade to empty lists and
//! writes keep the optimistic in-memory value; see `session` for where each
//! kind is raised and logged.

use crate::blocks::BlockId;
use thiserror::Error;

/// Failure reported by a content store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached or the call was interrupted
    #[error("content store transport error: {0}")]
    Transport(String),

    /// A page, block or component record does not exist
    #[error("{model} record {id} not found")]
    NotFound { model: String, id: u64 },

    /// The backend refused the write
    #[error("content store rejected the write: {0}")]
    Rejected(String),
}

/// Soft failures surfaced by a translation session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to load locales: {0}")]
    LocaleLoadFailure(#[source] StoreError),

    #[error("failed to load translations for {locale}: {source}")]
    TranslationLoadFailure {
        locale: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to save {field_label} of block {block_id}: {source}")]
    FieldWriteFailure {
        block_id: BlockId,
        field_label: String,
        #[source]
        source: StoreError,
    },

    #[error("block {block_id} has unknown type '{block_type}'")]
    UnknownBlockType {
        block_id: BlockId,
        block_type: String,
    },

    #[error("no translation row at index {index} ({len} rows loaded)")]
    RowOutOfRange { index: usize, len: usize },
}

/// Result type for content store calls
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::NotFound {
            model: "cms.block".to_string(),
            id: 7,
        };
        assert_eq!(err.to_string(), "cms.block record 7 not found");
    }

    #[test]
    fn test_field_write_failure_message_includes_source() {
        let err = SessionError::FieldWriteFailure {
            block_id: 42,
            field_label: "Button Text".to_string(),
            source: StoreError::Transport("connection reset".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("Button Text"));
        assert!(message.contains("42"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_row_out_of_range_message() {
        let err = SessionError::RowOutOfRange { index: 9, len: 3 };
        assert_eq!(
            err.to_string(),
            "no translation row at index 9 (3 rows loaded)"
        );
    }
}
