//! Turns a [`SearchFilter`] into an ordered conjunction of typed predicates.

use super::domain::{is_latitude, is_longitude, Coordinate, ListingType};
use super::filter::{
    is_wildcard, parse_count, parse_decimal, present, FilterError, FilterField, SearchFilter,
};

/// One active search condition together with the value it is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    ListingTypeIs(ListingType),
    MinPrice(i64),
    MaxPrice(i64),
    MinBedrooms(i64),
    NearUniversity(String),
    WithinDistance { origin: Coordinate, max_miles: f64 },
}

impl Predicate {
    pub fn field(&self) -> FilterField {
        match self {
            Predicate::ListingTypeIs(_) => FilterField::ListingType,
            Predicate::MinPrice(_) => FilterField::MinPrice,
            Predicate::MaxPrice(_) => FilterField::MaxPrice,
            Predicate::MinBedrooms(_) => FilterField::Bedrooms,
            Predicate::NearUniversity(_) => FilterField::University,
            Predicate::WithinDistance { .. } => FilterField::MaxDistance,
        }
    }
}

/// Validated search: the predicates to AND together and the optional reference point.
///
/// An empty predicate list matches every listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPlan {
    pub predicates: Vec<Predicate>,
    pub origin: Option<Coordinate>,
}

impl SearchPlan {
    pub fn is_geographic(&self) -> bool {
        self.origin.is_some()
    }
}

/// Build the plan for `filter`. Pure; rejects malformed input instead of ignoring it.
pub fn build_plan(filter: &SearchFilter) -> Result<SearchPlan, FilterError> {
    let mut predicates = Vec::new();

    if let Some(raw) = present(&filter.listing_type) {
        if !is_wildcard(raw, "all") {
            let listing_type = ListingType::parse(raw)
                .ok_or_else(|| FilterError::UnknownListingType(raw.to_string()))?;
            predicates.push(Predicate::ListingTypeIs(listing_type));
        }
    }

    let min_price = present(&filter.min_price)
        .map(|raw| parse_count(FilterField::MinPrice, raw))
        .transpose()?;
    let max_price = present(&filter.max_price)
        .map(|raw| parse_count(FilterField::MaxPrice, raw))
        .transpose()?;
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Err(FilterError::InvertedPriceRange { min, max });
        }
    }
    predicates.extend(min_price.map(Predicate::MinPrice));
    predicates.extend(max_price.map(Predicate::MaxPrice));

    if let Some(raw) = present(&filter.bedrooms) {
        if !is_wildcard(raw, "any") {
            predicates.push(Predicate::MinBedrooms(parse_count(
                FilterField::Bedrooms,
                raw,
            )?));
        }
    }

    if let Some(raw) = present(&filter.university) {
        if !is_wildcard(raw, "any") {
            predicates.push(Predicate::NearUniversity(raw.to_string()));
        }
    }

    let origin = parse_origin(filter)?;
    let max_distance = present(&filter.max_distance)
        .map(|raw| parse_decimal(FilterField::MaxDistance, raw))
        .transpose()?;

    match (origin, max_distance) {
        (_, Some(miles)) if miles <= 0.0 => {
            return Err(FilterError::OutOfRange {
                field: FilterField::MaxDistance,
                value: miles,
            });
        }
        (Some(origin), Some(max_miles)) => {
            predicates.push(Predicate::WithinDistance { origin, max_miles });
        }
        (None, Some(_)) => return Err(FilterError::DistanceWithoutOrigin),
        (_, None) => {}
    }

    Ok(SearchPlan { predicates, origin })
}

fn parse_origin(filter: &SearchFilter) -> Result<Option<Coordinate>, FilterError> {
    let latitude = present(&filter.latitude)
        .map(|raw| parse_decimal(FilterField::Latitude, raw))
        .transpose()?;
    let longitude = present(&filter.longitude)
        .map(|raw| parse_decimal(FilterField::Longitude, raw))
        .transpose()?;

    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(FilterError::UnpairedCoordinate {
            present: FilterField::Latitude,
            missing: FilterField::Longitude,
        }),
        (None, Some(_)) => Err(FilterError::UnpairedCoordinate {
            present: FilterField::Longitude,
            missing: FilterField::Latitude,
        }),
        (Some(latitude), Some(longitude)) => {
            if !is_latitude(latitude) {
                return Err(FilterError::OutOfRange {
                    field: FilterField::Latitude,
                    value: latitude,
                });
            }
            if !is_longitude(longitude) {
                return Err(FilterError::OutOfRange {
                    field: FilterField::Longitude,
                    value: longitude,
                });
            }
            Ok(Coordinate::new(latitude, longitude))
        }
    }
}
