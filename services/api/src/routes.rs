use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use campus_listings::listings::{
    listing_router, registration_router, ListingService, PropertyRepository, RegistrationService,
    StudentRepository,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_listing_routes<R, S>(
    listings: Arc<ListingService<R>>,
    registrations: Arc<RegistrationService<S>>,
) -> axum::Router
where
    R: PropertyRepository + 'static,
    S: StudentRepository + 'static,
{
    listing_router(listings)
        .merge(registration_router(registrations))
        .route("/health", axum::routing::get(healthcheck))
        .route("/api/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "started_at": state.started_at.to_rfc3339(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use campus_listings::listings::{seed_listings, SqliteListingStore};
    use chrono::Utc;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let store = Arc::new(SqliteListingStore::in_memory().expect("store opens"));
        seed_listings(&store, true).expect("seed succeeds");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            started_at: Utc::now(),
        };
        with_listing_routes(
            Arc::new(ListingService::new(store.clone())),
            Arc::new(RegistrationService::new(store)),
        )
        .layer(Extension(state))
    }

    async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    #[tokio::test]
    async fn health_routes_report_ok() {
        for uri in ["/health", "/api/health"] {
            let (status, body) = get_json(app(true), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
        }
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (status, body) = get_json(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let (status, _) = get_json(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_catalog_is_searchable_over_http() {
        let (status, body) = get_json(
            app(true),
            "/api/properties?type=rent&university=University%20of%20Washington",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let listings = body.as_array().expect("array payload");
        assert_eq!(listings.len(), 2);
        assert!(listings
            .iter()
            .all(|listing| listing["type"] == "rent"
                && listing["nearUniversity"] == "University of Washington"));
    }

    #[tokio::test]
    async fn nearby_search_orders_by_distance() {
        let (status, body) = get_json(
            app(true),
            "/api/properties?latitude=47.655548&longitude=-122.3032&maxDistance=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let distances: Vec<f64> = body
            .as_array()
            .expect("array payload")
            .iter()
            .map(|listing| listing["distance"].as_f64().expect("distance present"))
            .collect();
        assert_eq!(distances.len(), 3);
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn universities_route_lists_seeded_campuses() {
        let (status, body) = get_json(app(true), "/api/universities").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                "Seattle Pacific University",
                "Seattle University",
                "University of Washington"
            ])
        );
    }
}
