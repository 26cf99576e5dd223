use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use super::domain::{NewProperty, PropertyId, PropertyValidationError, SearchResult};
use super::filter::{FilterError, SearchFilter};
use super::format::format_rows;
use super::predicate::build_plan;
use super::query::{compose, compose_lookup};
use super::repository::{PropertyRepository, RepositoryError};

/// Service composing the predicate builder, query composer, repository, and formatter.
pub struct ListingService<R> {
    repository: Arc<R>,
}

impl<R> ListingService<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Run a filtered search. Filters are validated before storage is touched.
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<SearchResult>, ListingServiceError> {
        let plan = build_plan(filter)?;
        let query = compose(&plan);
        debug!(
            predicates = plan.predicates.len(),
            order = ?query.order,
            "running listing search"
        );

        let rows = self.repository.search(&query).map_err(|err| {
            error!(error = %err, "listing search failed");
            ListingServiceError::from(err)
        })?;

        let results = format_rows(rows);
        debug!(results = results.len(), "listing search complete");
        Ok(results)
    }

    /// Fetch one listing by id.
    pub fn get(&self, id: PropertyId) -> Result<SearchResult, ListingServiceError> {
        let rows = self.repository.search(&compose_lookup(id))?;
        format_rows(rows)
            .into_iter()
            .next()
            .ok_or(ListingServiceError::NotFound(id))
    }

    /// Validate and store a listing with its ordered images, returning it as stored.
    pub fn create(&self, payload: NewProperty) -> Result<SearchResult, ListingServiceError> {
        let draft = payload.into_draft()?;
        let id = self.repository.insert(&draft, Utc::now()).map_err(|err| {
            error!(error = %err, "listing insert failed");
            ListingServiceError::from(err)
        })?;
        info!(
            property = id.0,
            images = draft.images.len(),
            listing_type = %draft.listing_type,
            "listing created"
        );
        self.get(id)
    }

    pub fn universities(&self) -> Result<Vec<String>, ListingServiceError> {
        Ok(self.repository.universities()?)
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    InvalidFilter(#[from] FilterError),
    #[error(transparent)]
    InvalidProperty(#[from] PropertyValidationError),
    #[error("listing {0} not found")]
    NotFound(PropertyId),
    #[error("listing storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<RepositoryError> for ListingServiceError {
    fn from(value: RepositoryError) -> Self {
        Self::StorageUnavailable(value.to_string())
    }
}
