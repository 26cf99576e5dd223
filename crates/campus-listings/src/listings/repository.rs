use chrono::{DateTime, Utc};

use super::domain::{PropertyDraft, PropertyId};
use super::format::RawPropertyRow;
use super::query::ComposedQuery;
use super::registration::{NewStudent, StudentId};

/// Storage abstraction so the listing service can be exercised in isolation.
pub trait PropertyRepository: Send + Sync {
    /// Execute a composed retrieval and return its grouped rows in query order.
    fn search(&self, query: &ComposedQuery) -> Result<Vec<RawPropertyRow>, RepositoryError>;
    /// Insert a listing and its images atomically.
    fn insert(
        &self,
        draft: &PropertyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<PropertyId, RepositoryError>;
    /// Distinct non-null university names in ascending order.
    fn universities(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Storage for student sign-ups.
pub trait StudentRepository: Send + Sync {
    fn register(
        &self,
        student: &NewStudent,
        registered_at: DateTime<Utc>,
    ) -> Result<StudentId, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored row could not be decoded: {0}")]
    Decode(String),
}
