//! Graph error taxonomy

use super::types::{ElementId, ElementKind};
use crate::document::StoreError;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// The backing document of an element no longer exists
    #[error("{kind} {id} not found")]
    NotFound { kind: ElementKind, id: ElementId },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Uniqueness constraint on `id` rejected an insert
    #[error("Duplicate id {id} in collection {collection}")]
    DuplicateId { collection: String, id: ElementId },

    /// A targeted update matched no document: the stored element changed
    /// since this handle last loaded it
    #[error("Update conflict on {kind} {id}: stored document no longer matches the loaded snapshot")]
    Conflict { kind: ElementKind, id: ElementId },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Operation not implemented: {0}")]
    Unimplemented(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl GraphError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidArgument(message.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        GraphError::MalformedDocument(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
