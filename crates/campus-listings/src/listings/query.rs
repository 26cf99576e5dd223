//! Renders a [`SearchPlan`] into the single SQL statement that retrieves listings.
//!
//! The statement left-joins `property_images` so listings without photos are
//! kept, groups back to one row per property, and concatenates image
//! references in display order using [`IMAGE_SEPARATOR`]. All caller-supplied
//! values travel as numbered bind parameters.

use super::distance::SQL_FUNCTION_NAME;
use super::domain::{Coordinate, PropertyId};
use super::format::IMAGE_SEPARATOR;
use super::predicate::{Predicate, SearchPlan};

/// A value bound to a numbered SQL placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Integer(i64),
    Real(f64),
    Text(String),
}

/// How the result set is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Nearest first; listings without a coordinate last, then by id.
    Distance,
    /// Newest `created_at` first, then by id.
    Newest,
}

/// A fully rendered retrieval ready to execute once.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub order: SortOrder,
}

#[derive(Default)]
struct Binder {
    params: Vec<SqlParam>,
}

impl Binder {
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    fn distance_expr(&mut self, origin: Coordinate) -> String {
        let lat = self.bind(SqlParam::Real(origin.latitude));
        let lon = self.bind(SqlParam::Real(origin.longitude));
        format!("{SQL_FUNCTION_NAME}({lat}, {lon}, p.latitude, p.longitude)")
    }
}

fn select_clause(distance_expr: &str) -> String {
    format!(
        "SELECT p.id, p.price, p.bedrooms, p.bathrooms, p.sqft, p.address, p.description, \
         p.type, p.near_university, p.latitude, p.longitude, p.created_at, \
         group_concat(pi.image_url, char({separator}) ORDER BY pi.display_order, pi.id) AS images, \
         {distance_expr} AS distance \
         FROM properties p \
         LEFT JOIN property_images pi ON pi.property_id = p.id",
        separator = IMAGE_SEPARATOR as u32,
    )
}

fn render_predicate(predicate: &Predicate, binder: &mut Binder) -> String {
    match predicate {
        Predicate::ListingTypeIs(listing_type) => {
            let slot = binder.bind(SqlParam::Text(listing_type.as_str().to_string()));
            format!("p.type = {slot}")
        }
        Predicate::MinPrice(price) => format!("p.price >= {}", binder.bind(SqlParam::Integer(*price))),
        Predicate::MaxPrice(price) => format!("p.price <= {}", binder.bind(SqlParam::Integer(*price))),
        Predicate::MinBedrooms(count) => {
            format!("p.bedrooms >= {}", binder.bind(SqlParam::Integer(*count)))
        }
        Predicate::NearUniversity(name) => {
            format!("p.near_university = {}", binder.bind(SqlParam::Text(name.clone())))
        }
        Predicate::WithinDistance { origin, max_miles } => {
            let distance = binder.distance_expr(*origin);
            let limit = binder.bind(SqlParam::Real(*max_miles));
            format!(
                "(p.latitude IS NOT NULL AND p.longitude IS NOT NULL AND {distance} <= {limit})"
            )
        }
    }
}

/// Compose the search statement for a validated plan.
pub fn compose(plan: &SearchPlan) -> ComposedQuery {
    let mut binder = Binder::default();

    let (distance_expr, order) = match plan.origin {
        Some(origin) => (binder.distance_expr(origin), SortOrder::Distance),
        None => ("NULL".to_string(), SortOrder::Newest),
    };

    let mut sql = select_clause(&distance_expr);

    let conditions: Vec<String> = plan
        .predicates
        .iter()
        .map(|predicate| render_predicate(predicate, &mut binder))
        .collect();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(" GROUP BY p.id");
    sql.push_str(match order {
        SortOrder::Distance => " ORDER BY distance IS NULL, distance ASC, p.id ASC",
        SortOrder::Newest => " ORDER BY p.created_at DESC, p.id ASC",
    });

    ComposedQuery {
        sql,
        params: binder.params,
        order,
    }
}

/// Compose the single-listing lookup; same projection, no distance.
pub fn compose_lookup(id: PropertyId) -> ComposedQuery {
    let mut binder = Binder::default();
    let mut sql = select_clause("NULL");
    let slot = binder.bind(SqlParam::Integer(id.0));
    sql.push_str(&format!(" WHERE p.id = {slot} GROUP BY p.id"));

    ComposedQuery {
        sql,
        params: binder.params,
        order: SortOrder::Newest,
    }
}
