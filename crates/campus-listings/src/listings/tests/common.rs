use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::listings::domain::{
    Coordinate, ListingType, NewProperty, Property, PropertyDraft, PropertyId,
};
use crate::listings::format::{join_images, RawPropertyRow};
use crate::listings::query::{ComposedQuery, SqlParam};
use crate::listings::registration::{NewStudent, RegistrationService, StudentId};
use crate::listings::repository::{PropertyRepository, RepositoryError, StudentRepository};
use crate::listings::router::{listing_router, registration_router};
use crate::listings::service::ListingService;

pub(super) fn created_at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 9, minute, 0).unwrap()
}

pub(super) fn raw_row(id: i64, images: &[&str], distance: Option<f64>) -> RawPropertyRow {
    let images: Vec<String> = images.iter().map(|image| image.to_string()).collect();
    RawPropertyRow {
        property: Property {
            id: PropertyId(id),
            price: 2100,
            bedrooms: 2,
            bathrooms: 1.0,
            sqft: 950,
            address: format!("{id} 15th Ave NE, Seattle, WA 98105"),
            description: "Updated apartment with balcony".to_string(),
            listing_type: ListingType::Rent,
            near_university: Some("University of Washington".to_string()),
            location: Coordinate::new(47.6616, -122.3126),
            created_at: created_at(id as u32 % 60),
        },
        images: if images.is_empty() {
            None
        } else {
            Some(join_images(&images))
        },
        distance,
    }
}

pub(super) fn new_property() -> NewProperty {
    NewProperty {
        price: 1800,
        bedrooms: 1,
        bathrooms: 1.0,
        sqft: 800,
        address: "4700 Brooklyn Ave NE, Seattle, WA 98105".to_string(),
        description: "Cozy studio in the heart of the U-District.".to_string(),
        listing_type: ListingType::Rent,
        near_university: Some("University of Washington".to_string()),
        latitude: Some(47.6633),
        longitude: Some(-122.3141),
        images: vec![
            "https://example.com/studio1a.jpg".to_string(),
            "https://example.com/studio1b.jpg".to_string(),
        ],
    }
}

/// Repository returning canned grouped rows and recording every query it receives.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) rows: Arc<Mutex<Vec<RawPropertyRow>>>,
    pub(super) queries: Arc<Mutex<Vec<ComposedQuery>>>,
}

impl MemoryRepository {
    pub(super) fn with_rows(rows: Vec<RawPropertyRow>) -> Self {
        let repository = Self::default();
        *repository.rows.lock().expect("rows mutex poisoned") = rows;
        repository
    }

    pub(super) fn queries(&self) -> Vec<ComposedQuery> {
        self.queries.lock().expect("query mutex poisoned").clone()
    }
}

impl PropertyRepository for MemoryRepository {
    fn search(&self, query: &ComposedQuery) -> Result<Vec<RawPropertyRow>, RepositoryError> {
        self.queries
            .lock()
            .expect("query mutex poisoned")
            .push(query.clone());

        let rows = self.rows.lock().expect("rows mutex poisoned");
        if query.sql.contains("WHERE p.id = ") {
            let wanted = match query.params.first() {
                Some(SqlParam::Integer(id)) => *id,
                _ => return Ok(Vec::new()),
            };
            return Ok(rows
                .iter()
                .filter(|row| row.property.id.0 == wanted)
                .cloned()
                .collect());
        }
        Ok(rows.clone())
    }

    fn insert(
        &self,
        draft: &PropertyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<PropertyId, RepositoryError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        let id = PropertyId(rows.len() as i64 + 1);
        rows.push(RawPropertyRow {
            property: Property {
                id,
                price: draft.price,
                bedrooms: draft.bedrooms,
                bathrooms: draft.bathrooms,
                sqft: draft.sqft,
                address: draft.address.clone(),
                description: draft.description.clone(),
                listing_type: draft.listing_type,
                near_university: draft.near_university.clone(),
                location: draft.location,
                created_at,
            },
            images: if draft.images.is_empty() {
                None
            } else {
                Some(join_images(&draft.images))
            },
            distance: None,
        });
        Ok(id)
    }

    fn universities(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = self.rows.lock().expect("rows mutex poisoned");
        let names: BTreeSet<String> = rows
            .iter()
            .filter_map(|row| row.property.near_university.clone())
            .collect();
        Ok(names.into_iter().collect())
    }
}

pub(super) struct UnavailableRepository;

impl PropertyRepository for UnavailableRepository {
    fn search(&self, _query: &ComposedQuery) -> Result<Vec<RawPropertyRow>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(
        &self,
        _draft: &PropertyDraft,
        _created_at: DateTime<Utc>,
    ) -> Result<PropertyId, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn universities(&self) -> Result<Vec<String>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStudents {
    pub(super) emails: Arc<Mutex<Vec<String>>>,
}

impl StudentRepository for MemoryStudents {
    fn register(
        &self,
        student: &NewStudent,
        _registered_at: DateTime<Utc>,
    ) -> Result<StudentId, RepositoryError> {
        let mut emails = self.emails.lock().expect("student mutex poisoned");
        if emails.contains(&student.email) {
            return Err(RepositoryError::Conflict(student.email.clone()));
        }
        emails.push(student.email.clone());
        Ok(StudentId(emails.len() as i64))
    }
}

pub(super) fn build_service(
    rows: Vec<RawPropertyRow>,
) -> (ListingService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::with_rows(rows));
    let service = ListingService::new(repository.clone());
    (service, repository)
}

pub(super) fn router_with_rows(rows: Vec<RawPropertyRow>) -> axum::Router {
    let (service, _) = build_service(rows);
    listing_router(Arc::new(service)).merge(registration_router(Arc::new(
        RegistrationService::new(Arc::new(MemoryStudents::default())),
    )))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
