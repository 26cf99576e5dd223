//! Property catalog and the dynamic listing search.
//!
//! A search flows through four stages: [`predicate::build_plan`] validates the
//! caller's [`SearchFilter`] into typed predicates, [`query::compose`] renders
//! them into one grouped SQL statement, a [`PropertyRepository`] executes it,
//! and [`format::format_rows`] reshapes the grouped rows into [`SearchResult`]s.

pub mod distance;
pub mod domain;
pub mod filter;
pub mod format;
pub mod predicate;
pub mod query;
pub mod registration;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use distance::{haversine_miles, EARTH_RADIUS_MILES};
pub use domain::{
    Coordinate, ListingType, ListingView, NewProperty, Property, PropertyDraft, PropertyId,
    PropertyValidationError, SearchResult,
};
pub use filter::{FilterError, FilterField, SearchFilter};
pub use predicate::{build_plan, Predicate, SearchPlan};
pub use query::{compose, ComposedQuery, SortOrder};
pub use registration::{
    RegistrationError, RegistrationService, RegistrationServiceError, StudentRegistration,
};
pub use repository::{PropertyRepository, RepositoryError, StudentRepository};
pub use router::{listing_router, registration_router};
pub use seed::{sample_listings, seed_listings, SeedError};
pub use service::{ListingService, ListingServiceError};
pub use sqlite::SqliteListingStore;
