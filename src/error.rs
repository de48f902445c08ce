//! Error types for chain resolution and catalog access

use thiserror::Error;

pub type ChainResult<T> = Result<T, ChainError>;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Invalid process data in process {process_id}: {reason}")]
    InvalidProcessData { process_id: String, reason: String },

    #[error("No process configured: product {product_id} is a raw material")]
    NoProcessConfigured { product_id: String },

    #[error("Dangling {kind} reference: {id}")]
    DanglingReference { kind: &'static str, id: String },

    #[error("Cycle or depth limit at product {product_id} (depth {depth}): {reason}")]
    CycleOrDepthExceeded {
        product_id: String,
        depth: u32,
        reason: String,
    },

    #[error("Invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChainError {
    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        ChainError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_process(process_id: &str, reason: impl Into<String>) -> Self {
        ChainError::InvalidProcessData {
            process_id: process_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_catalog(reason: impl Into<String>) -> Self {
        ChainError::InvalidCatalog {
            reason: reason.into(),
        }
    }
}
