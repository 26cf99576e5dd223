use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task;

use crate::error::AppError;

use super::domain::{ListingView, NewProperty, PropertyId, SearchResult};
use super::filter::SearchFilter;
use super::registration::{RegistrationService, StudentRegistration};
use super::repository::{PropertyRepository, StudentRepository};
use super::service::ListingService;

/// Router exposing listing search, lookup, creation, and the university list.
pub fn listing_router<R>(service: Arc<ListingService<R>>) -> Router
where
    R: PropertyRepository + 'static,
{
    Router::new()
        .route(
            "/api/properties",
            get(search_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/properties/:property_id", get(lookup_handler::<R>))
        .route("/api/universities", get(universities_handler::<R>))
        .with_state(service)
}

/// Router exposing the student registration form endpoint.
pub fn registration_router<S>(service: Arc<RegistrationService<S>>) -> Router
where
    S: StudentRepository + 'static,
{
    Router::new()
        .route("/api/students/register", post(register_handler::<S>))
        .with_state(service)
}

pub(crate) async fn search_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<ListingView>>, AppError>
where
    R: PropertyRepository + 'static,
{
    let results = task::spawn_blocking(move || service.search(&filter)).await??;
    Ok(Json(results.iter().map(SearchResult::view).collect()))
}

pub(crate) async fn lookup_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(property_id): Path<i64>,
) -> Result<Json<ListingView>, AppError>
where
    R: PropertyRepository + 'static,
{
    let result = task::spawn_blocking(move || service.get(PropertyId(property_id))).await??;
    Ok(Json(result.view()))
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Json(payload): Json<NewProperty>,
) -> Result<(StatusCode, Json<ListingView>), AppError>
where
    R: PropertyRepository + 'static,
{
    let result = task::spawn_blocking(move || service.create(payload)).await??;
    Ok((StatusCode::CREATED, Json(result.view())))
}

pub(crate) async fn universities_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
) -> Result<Json<Vec<String>>, AppError>
where
    R: PropertyRepository + 'static,
{
    let names = task::spawn_blocking(move || service.universities()).await??;
    Ok(Json(names))
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    Json(registration): Json<StudentRegistration>,
) -> Result<(StatusCode, Json<Value>), AppError>
where
    S: StudentRepository + 'static,
{
    let id = task::spawn_blocking(move || service.register(registration)).await??;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "message": "registration received",
        })),
    ))
}
