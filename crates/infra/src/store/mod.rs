//! Store abstractions and their backends.
//!
//! Traits are async so the same engine runs against the in-memory tables
//! (tests/dev) and Postgres (feature `postgres`).

pub mod bills;
pub mod catalog;
pub mod users;

#[cfg(feature = "postgres")]
pub mod postgres;

use thiserror::Error;

use billing_core::DomainError;

pub use bills::{BillStore, InMemoryBillStore};
pub use catalog::{CatalogStore, InMemoryCatalogStore};
pub use users::{InMemoryUserDirectory, UserDirectory, UserRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// A versioned write lost against a concurrent writer.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Stored or submitted data failed a domain check.
    #[error("invalid data: {0}")]
    Invalid(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub(crate) fn poisoned() -> Self {
        Self::Backend("store lock poisoned".to_string())
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => StoreError::NotFound,
            DomainError::Conflict(msg) => StoreError::ConcurrentModification(msg),
            other => StoreError::Invalid(other.to_string()),
        }
    }
}
