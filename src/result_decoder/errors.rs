use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Row has {found} slot(s), expected {expected}")]
    RowShapeMismatch { expected: usize, found: usize },

    #[error("Response has no rows")]
    NoRows,

    #[error("Row is empty (no node in slot 0)")]
    EmptyRow,

    #[error("Slot {slot} is null but must hold a {expected}")]
    NullSlot { slot: usize, expected: &'static str },

    #[error("Slot {slot} is not a valid {expected}: {source}")]
    InvalidSlot {
        slot: usize,
        expected: &'static str,
        source: serde_json::Error,
    },

    #[error("Invalid timestamp in field '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Count result is missing or not a non-negative integer: {0}")]
    InvalidCount(String),

    #[error("Response is not a Cypher result: {0}")]
    Json(#[from] serde_json::Error),
}
